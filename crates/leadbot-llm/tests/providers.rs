//! HTTP provider clients against wiremock.

use leadbot_llm::{
    AnthropicClient, ChatMessage, CompletionProvider, LlmError, OpenAiClient, ProviderSettings,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(model: &str) -> ProviderSettings {
    ProviderSettings {
        api_key: "test-key".to_string(),
        model: model.to_string(),
        max_tokens: 256,
        timeout_secs: 5,
    }
}

fn conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("hello"),
        ChatMessage::assistant("Hi! How can I help?"),
        ChatMessage::user("what's your pricing?"),
    ]
}

#[tokio::test]
async fn anthropic_sends_headers_and_joins_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-test",
            "max_tokens": 256,
            "system": "be brief",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "Plans start " },
                { "type": "text", "text": "at $99." }
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::with_base_url(&settings("claude-test"), &server.uri())
        .expect("client construction should not fail");
    let text = client
        .complete("be brief", &conversation())
        .await
        .expect("completion");
    assert_eq!(text, "Plans start at $99.");
}

#[tokio::test]
async fn anthropic_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&server)
        .await;

    let client = AnthropicClient::with_base_url(&settings("claude-test"), &server.uri())
        .expect("client construction should not fail");
    let err = client.complete("sys", &conversation()).await.unwrap_err();
    match err {
        LlmError::Api {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, "anthropic");
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn anthropic_empty_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "content": [] })),
        )
        .mount(&server)
        .await;

    let client = AnthropicClient::with_base_url(&settings("claude-test"), &server.uri())
        .expect("client construction should not fail");
    let err = client.complete("sys", &conversation()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyCompletion { provider: "anthropic" }));
}

#[tokio::test]
async fn openai_prepends_system_message_and_uses_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-test",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" },
                { "role": "assistant", "content": "Hi! How can I help?" },
                { "role": "user", "content": "what's your pricing?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": " Fallback answer. " } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url(&settings("gpt-test"), &server.uri())
        .expect("client construction should not fail");
    let text = client
        .complete("be brief", &conversation())
        .await
        .expect("completion");
    assert_eq!(text, "Fallback answer.");
}

#[tokio::test]
async fn openai_unauthorized_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url(&settings("gpt-test"), &server.uri())
        .expect("client construction should not fail");
    let err = client.complete("sys", &conversation()).await.unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 401, .. }));
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url(&settings("gpt-test"), &server.uri())
        .expect("client construction should not fail");
    let err = client.complete("sys", &conversation()).await.unwrap_err();
    assert!(matches!(err, LlmError::Deserialize { .. }));
}
