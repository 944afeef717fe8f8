//! Anthropic provider implementation using the Messages API.
//!
//! Wire format notes:
//! - the system prompt is a top-level `system` field, not a message
//! - `messages` carries the conversation verbatim (`user`/`assistant` roles)
//! - streaming responses are SSE: `content_block_delta` events carry
//!   `text_delta` fragments, `message_stop` closes the stream, and `error`
//!   events report in-stream failures

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::completion::{
    CompletionProvider, CompletionRequest, Message, ProviderError, StreamEvent,
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Messages API Types
// ============================================================================

/// The request body for `POST /v1/messages`.
#[derive(Serialize, Debug)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    stream: bool,
    messages: Vec<Message>,
}

/// Generic SSE event wrapper to extract the embedded type field.
/// Anthropic repeats the event name inside the data JSON, so the `event:`
/// line and this field are interchangeable.
#[derive(Deserialize, Debug)]
struct SseEvent {
    #[serde(rename = "type")]
    event_type: String,
}

/// SSE event for `content_block_delta`.
#[derive(Deserialize, Debug)]
struct ContentBlockDeltaEvent {
    delta: DeltaPayload,
}

#[derive(Deserialize, Debug)]
struct DeltaPayload {
    #[serde(rename = "type")]
    delta_type: String,
    #[serde(default)]
    text: String,
}

/// SSE event for in-stream `error` events.
#[derive(Deserialize, Debug)]
struct ErrorEvent {
    error: ErrorPayload,
}

#[derive(Deserialize, Debug)]
struct ErrorPayload {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Builds the request body, carrying the conversation through unchanged.
fn build_request(request: &CompletionRequest<'_>) -> MessagesRequest {
    MessagesRequest {
        model: request.model.to_string(),
        max_tokens: request.max_tokens,
        system: request.system.to_string(),
        stream: true,
        messages: request.conversation.messages.clone(),
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Anthropic API provider using the streaming Messages endpoint.
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `base_url` - Optional custom base URL (defaults to the public API)
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Sends a request to the Messages endpoint and returns the raw response.
    async fn send_request(
        &self,
        request: &MessagesRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Anthropic response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Anthropic API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Config(
                "missing API key (set ANTHROPIC_API_KEY or [anthropic].api_key)".to_string(),
            ));
        }

        let messages_request = build_request(&request);

        info!(
            "Anthropic Messages API request: model={}, messages={}",
            request.model,
            messages_request.messages.len(),
        );

        let response = self.send_request(&messages_request).await?;

        // Process the SSE stream line by line
        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut current_event_type: Option<String> = None;
        let mut fragment_count = 0usize;
        let mut total_content_len = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ProviderError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Process complete lines from the buffer
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..pos + 1);

                if let Some(event_type) = line.strip_prefix("event: ") {
                    current_event_type = Some(event_type.to_string());
                    continue;
                }

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };

                // The event name also lives in the data JSON; fall back to it
                // when no `event:` line preceded this data line.
                let event_type = current_event_type.take().or_else(|| {
                    serde_json::from_str::<SseEvent>(data)
                        .ok()
                        .map(|e| e.event_type)
                });

                match event_type.as_deref() {
                    Some("content_block_delta") => {
                        if let Ok(event) = serde_json::from_str::<ContentBlockDeltaEvent>(data)
                            && event.delta.delta_type == "text_delta"
                            && !event.delta.text.is_empty()
                        {
                            fragment_count += 1;
                            total_content_len += event.delta.text.len();
                            debug!(
                                "Relaying fragment (len={}, total={})",
                                event.delta.text.len(),
                                total_content_len
                            );
                            if sender
                                .send(StreamEvent::Delta(event.delta.text))
                                .await
                                .is_err()
                            {
                                warn!("Fragment send failed: receiver dropped");
                                return Err(ProviderError::ChannelClosed);
                            }
                        }
                    }
                    Some("message_stop") => {
                        info!(
                            "Stream complete: {} fragments, {} content bytes",
                            fragment_count, total_content_len
                        );
                        if sender.send(StreamEvent::Done).await.is_err() {
                            warn!("Done send failed: receiver dropped");
                            return Err(ProviderError::ChannelClosed);
                        }
                        return Ok(());
                    }
                    Some("error") => {
                        let message = match serde_json::from_str::<ErrorEvent>(data) {
                            Ok(event) => {
                                format!("{}: {}", event.error.error_type, event.error.message)
                            }
                            Err(_) => data.to_string(),
                        };
                        warn!("In-stream error event: {}", message);
                        return Err(ProviderError::Stream(message));
                    }
                    Some(other) => {
                        // message_start, content_block_start/stop, ping, etc.
                        debug!("Ignoring event type '{}'", other);
                    }
                    None => {
                        debug!("Could not determine event type for data: {}", data);
                    }
                }
            }
        }

        // Stream ended without a message_stop. Treat as normal completion so
        // the consumer is never left waiting on a handle that will not close.
        info!(
            "Stream ended without message_stop: {} fragments, {} content bytes",
            fragment_count, total_content_len
        );
        if sender.send(StreamEvent::Done).await.is_err() {
            return Err(ProviderError::ChannelClosed);
        }
        Ok(())
    }
}
