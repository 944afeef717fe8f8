use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{Conversation, StreamEvent};

/// Errors that can occur while opening or draining a completion stream.
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (missing API key, bad URL). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// API rejected the request with an error status.
    Api { status: u16, message: String },
    /// The provider reported an error mid-stream via an error event.
    Stream(String),
    /// The mpsc channel was closed (consumer dropped the receiver).
    ChannelClosed,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Stream(msg) => write!(f, "stream error: {msg}"),
            ProviderError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Everything a provider needs to fulfill one completion request.
///
/// The conversation is borrowed verbatim - providers must forward roles and
/// contents unchanged and in order. The system prompt rides alongside rather
/// than inside the history.
pub struct CompletionRequest<'a> {
    pub conversation: &'a Conversation,
    pub model: &'a str,
    pub system: &'a str,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Streams a completion for the given request.
    ///
    /// Fragments are relayed into `sender` verbatim and in provider order,
    /// followed by exactly one [`StreamEvent::Done`] when the stream closes
    /// normally. Any failure is returned as `Err` instead; partial fragments
    /// already sent remain valid.
    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError>;
}
