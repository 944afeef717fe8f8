//! # Actions
//!
//! Everything that can happen in Banter becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! A fragment arrives? That's `Action::ResponseDelta(text)`.
//!
//! The `update()` function takes the current state and an action and
//! mutates the state in place, returning an `Effect` for the event loop to
//! carry out. No I/O happens here, which is what makes the whole turn
//! algorithm testable without a terminal or a network.

use log::{debug, info, warn};

use crate::core::state::{App, TurnPhase};

/// Everything that can happen in the app.
#[derive(Debug, PartialEq)]
pub enum Action {
    /// User submitted input text for a new turn.
    Submit(String),
    /// One streamed fragment of the in-progress assistant reply.
    ResponseDelta(String),
    /// The provider closed the stream normally.
    ResponseDone,
    /// The provider call failed; the reason is shown to the user.
    ResponseFailed(String),
    /// User asked to quit.
    Quit,
}

/// Side effects `update()` asks the event loop to perform.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Start the background completion request for the current conversation.
    SpawnRequest,
    Quit,
}

/// The reducer: applies one action to the state.
///
/// The turn algorithm lives here. A submit appends the user message and
/// requests a stream; each delta folds into the growing assistant message;
/// done/failed return the phase to idle.
pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            let text = text.trim();
            if text.is_empty() {
                // Empty input is a no-op, not an error.
                return Effect::None;
            }
            if app.is_busy() {
                // One turn at a time: a second submit while streaming is
                // refused rather than queued or interleaved.
                debug!("Submit refused: turn already in flight");
                app.status_message = "Still replying - wait for the current response".to_string();
                return Effect::None;
            }
            app.conversation.push_user(text.to_string());
            app.phase = TurnPhase::AwaitingFirst;
            app.status_message = "Waiting for reply...".to_string();
            app.error = None;
            Effect::SpawnRequest
        }
        Action::ResponseDelta(text) => {
            if app.phase == TurnPhase::Idle {
                // Stale fragment from a turn that already failed or finished.
                warn!("Dropping fragment outside an active turn ({} bytes)", text.len());
                return Effect::None;
            }
            app.phase = TurnPhase::Streaming;
            app.status_message = "Streaming...".to_string();
            app.conversation.append_assistant_delta(&text);
            Effect::None
        }
        Action::ResponseDone => {
            info!("Turn complete ({} messages)", app.conversation.len());
            app.phase = TurnPhase::Idle;
            app.status_message = String::new();
            Effect::None
        }
        Action::ResponseFailed(reason) => {
            warn!("Turn failed: {}", reason);
            app.phase = TurnPhase::Idle;
            app.status_message = String::new();
            app.error = Some(reason);
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}
