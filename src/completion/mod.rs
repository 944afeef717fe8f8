//! # Completion Layer
//!
//! Everything between the conversation and the hosted model: the message
//! data model, the provider trait, and the Anthropic implementation. A
//! provider's only output channel is the streaming handle it is given -
//! fragments go in verbatim and in order, followed by a single completion
//! signal.

pub mod provider;
pub mod providers;
pub mod types;

pub use provider::{CompletionProvider, CompletionRequest, ProviderError};
pub use providers::anthropic::AnthropicProvider;
pub use types::{Conversation, Message, Role, StreamEvent};
