//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

use crate::completion::{
    CompletionProvider, CompletionRequest, ProviderError, StreamEvent,
};
use crate::core::config::ResolvedConfig;

/// A no-op provider for tests that don't need real API calls.
pub struct NoopProvider;

#[async_trait]
impl CompletionProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        let _ = sender.send(StreamEvent::Done).await;
        Ok(())
    }
}

/// A ResolvedConfig with harmless test values.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        model_name: "test-model".to_string(),
        max_output_tokens: 256,
        system_prompt: "test system prompt".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: "http://127.0.0.1:0".to_string(),
    }
}

/// Creates a test App with a NoopProvider.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(NoopProvider), &test_config())
}
