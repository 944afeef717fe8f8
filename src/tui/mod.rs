//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm. The
//! streaming side lives in [`spawn_turn`]: a background provider task whose
//! only observable output is the stream channel, plus a forwarder that turns
//! stream events into actions for the synchronous event loop.

pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::completion::{
    AnthropicProvider, CompletionProvider, CompletionRequest, StreamEvent,
};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            // Non-blinking cursor: continuous redraws reset the terminal's
            // blink timer and make a blinking cursor look erratic.
            SetCursorStyle::SteadyBlock,
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

/// Build the provider from resolved config.
pub fn build_provider(config: &ResolvedConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(AnthropicProvider::new(
        config.api_key.clone().unwrap_or_default(),
        Some(config.base_url.clone()),
    ))
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let provider = build_provider(&config);
    let mut app = App::new(provider, &config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background streaming tasks
    let (tx, rx) = mpsc::channel();

    let mut should_quit = false;

    while !should_quit {
        terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;

        // Block briefly for the first event, then drain whatever else is
        // already pending so a burst of input lands in one frame.
        let first_event = poll_event_timeout(std::time::Duration::from_millis(100));
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Quit | TuiEvent::ForceQuit => {
                    if update(&mut app, Action::Quit) == Effect::Quit {
                        should_quit = true;
                    }
                }
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                }
                // Enter during an in-flight turn is refused before the input
                // box sees it, so the typed text stays in the buffer.
                TuiEvent::Submit if app.is_busy() => {
                    app.status_message =
                        "Still replying - wait for the current response".to_string();
                }
                _ => {
                    if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event)
                        && update(&mut app, Action::Submit(text)) == Effect::SpawnRequest
                    {
                        spawn_turn(&app, tx.clone());
                        tui.message_list.pin_to_bottom();
                    }
                }
            }
        }

        // Handle background task actions (streaming responses)
        while let Ok(action) = rx.try_recv() {
            debug!("Event loop received: {:?}", action);
            if matches!(action, Action::ResponseDelta(_)) {
                tui.message_list.pin_to_bottom();
            }
            if update(&mut app, action) == Effect::Quit {
                should_quit = true;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

/// Start one turn's worth of background streaming.
///
/// Fire-and-forget: nobody holds the task handles. The provider task writes
/// fragments into a fresh stream channel; the forwarder task drains that
/// channel into `tx` as actions. Completion (or failure) reaches the event
/// loop only through those actions - the channel is the sole synchronization
/// primitive between the stream and the UI.
pub fn spawn_turn(app: &App, tx: mpsc::Sender<Action>) {
    info!("Spawning completion request");

    // Clone what the async tasks need
    let provider = app.provider.clone();
    let conversation = app.conversation.clone();
    let model = app.model_name.clone();
    let system = app.system_prompt.clone();
    let max_tokens = app.max_output_tokens;

    let (stream_tx, mut stream_rx) = tokio::sync::mpsc::channel::<StreamEvent>(64);

    // Provider task: owns the HTTP stream, reports failure as an action
    let tx_failure = tx.clone();
    tokio::spawn(async move {
        let request = CompletionRequest {
            conversation: &conversation,
            model: &model,
            system: &system,
            max_tokens,
        };

        if let Err(e) = provider.stream_completion(request, stream_tx).await {
            warn!("Stream failed: {}", e);
            if tx_failure.send(Action::ResponseFailed(e.to_string())).is_err() {
                warn!("Failed to report stream failure: receiver dropped");
            }
        }
    });

    // Forwarder task: stream events → actions, in arrival order
    tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(event) = stream_rx.recv().await {
            match event {
                StreamEvent::Delta(text) => {
                    forwarded += 1;
                    if tx.send(Action::ResponseDelta(text)).is_err() {
                        warn!("Failed to forward fragment: receiver dropped");
                        return;
                    }
                }
                StreamEvent::Done => {
                    info!("Forwarding complete: {} fragments", forwarded);
                    if tx.send(Action::ResponseDone).is_err() {
                        warn!("Failed to send ResponseDone: receiver dropped");
                    }
                    return;
                }
            }
        }
        // Channel closed without Done: the provider task erred and already
        // reported the failure. Nothing more to forward.
        debug!("Stream channel closed after {} fragments", forwarded);
    });
}
