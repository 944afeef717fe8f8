//! # Application State
//!
//! Core business state for Banter. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use crate::completion::{CompletionProvider, Conversation};
use crate::core::config::ResolvedConfig;
use std::sync::Arc;

/// Where the current turn stands.
///
/// `Idle → AwaitingFirst → Streaming → Idle` on success; a provider failure
/// also lands back on `Idle` (with `App::error` set). Only `Idle` accepts a
/// new submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Request sent, no fragment received yet.
    AwaitingFirst,
    /// At least one fragment received, stream still open.
    Streaming,
}

pub struct App {
    pub provider: Arc<dyn CompletionProvider>,
    pub conversation: Conversation,
    pub model_name: String,
    pub system_prompt: String,
    pub max_output_tokens: u32,
    pub phase: TurnPhase,
    pub status_message: String,
    /// Most recent provider failure, cleared on the next accepted submit.
    pub error: Option<String>,
}

impl App {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &ResolvedConfig) -> Self {
        Self {
            provider,
            conversation: Conversation::new(),
            model_name: config.model_name.clone(),
            system_prompt: config.system_prompt.clone(),
            max_output_tokens: config.max_output_tokens,
            phase: TurnPhase::Idle,
            status_message: String::new(),
            error: None,
        }
    }

    /// True while a turn is in flight and new submissions are refused.
    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }
}
