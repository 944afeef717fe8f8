use banter::completion::{
    AnthropicProvider, CompletionProvider, CompletionRequest, Conversation, ProviderError,
    StreamEvent,
};
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

/// Creates a simple test conversation with a single user message
fn create_test_conversation() -> Conversation {
    let mut convo = Conversation::new();
    convo.push_user("Hello".to_string());
    convo
}

fn request<'a>(convo: &'a Conversation) -> CompletionRequest<'a> {
    CompletionRequest {
        conversation: convo,
        model: "test-model",
        system: "test system prompt",
        max_tokens: 256,
    }
}

/// Drains the stream channel into (fragments, saw_done)
async fn collect_events(mut receiver: mpsc::Receiver<StreamEvent>) -> (Vec<String>, bool) {
    let mut fragments = Vec::new();
    let mut saw_done = false;

    while let Some(event) = receiver.recv().await {
        match event {
            StreamEvent::Delta(text) => fragments.push(text),
            StreamEvent::Done => saw_done = true,
        }
    }

    (fragments, saw_done)
}

// ============================================================================
// Streaming Tests
// ============================================================================

#[tokio::test]
async fn test_successful_streaming_relays_fragments_in_order() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: message_start
data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_test\",\"role\":\"assistant\"}}

event: content_block_start
data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}

event: content_block_stop
data: {\"type\":\"content_block_stop\",\"index\":0}

event: message_stop
data: {\"type\":\"message_stop\"}
";

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(result.is_ok());

    let (fragments, saw_done) = collect_events(rx).await;
    assert_eq!(fragments, vec!["Hello", " world"]);
    assert!(saw_done, "stream must end with a completion signal");
}

#[tokio::test]
async fn test_ping_and_unknown_events_are_ignored() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: message_start
data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_test\"}}

event: ping
data: {\"type\":\"ping\"}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Text\"}}

event: message_delta
data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":3}}

event: message_stop
data: {\"type\":\"message_stop\"}
";

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(result.is_ok());

    let (fragments, saw_done) = collect_events(rx).await;
    assert_eq!(fragments, vec!["Text"]);
    assert!(saw_done);
}

#[tokio::test]
async fn test_stream_without_message_stop_still_completes() {
    let mock_server = MockServer::start().await;

    // Connection ends after the delta with no message_stop event
    let sse_response = "\
event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}
";

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(result.is_ok());

    let (fragments, saw_done) = collect_events(rx).await;
    assert_eq!(fragments, vec!["partial"]);
    assert!(saw_done, "consumer must never be left without a completion signal");
}

// ============================================================================
// Request Shape Tests
// ============================================================================

#[tokio::test]
async fn test_request_echoes_history_system_and_headers() {
    let mock_server = MockServer::start().await;

    let sse_response = "event: message_stop\ndata: {\"type\":\"message_stop\"}\n";

    // The mock only matches when history, system prompt, and auth headers
    // arrive exactly as configured - a non-match surfaces as HTTP 404.
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "system": "test system prompt",
            "stream": true,
            "messages": [
                {"role": "user", "content": "2+2?"},
                {"role": "assistant", "content": "4"},
                {"role": "user", "content": "and 3+3?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let mut convo = Conversation::new();
    convo.push_user("2+2?".to_string());
    convo.append_assistant_delta("4");
    convo.push_user("and 3+3?".to_string());

    let (tx, _rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(result.is_ok(), "expected match, got {:?}", result);
}

// ============================================================================
// Error Tests
// ============================================================================

#[tokio::test]
async fn test_api_error_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("invalid-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, _rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(matches!(result, Err(ProviderError::Api { status: 401, .. })));
}

#[tokio::test]
async fn test_in_stream_error_event() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"par\"}}

event: error
data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}
";

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    match result {
        Err(ProviderError::Stream(msg)) => assert!(msg.contains("Overloaded")),
        other => panic!("expected Stream error, got {:?}", other),
    }

    // Fragments delivered before the error are preserved for the consumer
    let (fragments, saw_done) = collect_events(rx).await;
    assert_eq!(fragments, vec!["par"]);
    assert!(!saw_done);
}

#[tokio::test]
async fn test_channel_closed_error() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}

event: message_stop
data: {\"type\":\"message_stop\"}
";

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("test-key".to_string(), Some(mock_server.uri()));

    let convo = create_test_conversation();
    let (tx, rx) = mpsc::channel(1);
    // Drop receiver immediately to simulate channel closed
    drop(rx);

    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(matches!(result, Err(ProviderError::ChannelClosed)));
}

#[tokio::test]
async fn test_missing_api_key_is_config_error() {
    // No server involved: the provider refuses before sending anything
    let provider = AnthropicProvider::new(String::new(), None);

    let convo = create_test_conversation();
    let (tx, _rx) = mpsc::channel(100);
    let result = provider.stream_completion(request(&convo), tx).await;

    assert!(matches!(result, Err(ProviderError::Config(_))));
}
