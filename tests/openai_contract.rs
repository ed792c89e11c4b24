//! OpenAI provider contract tests.
//!
//! Verify the exact Chat Completions wire format the client sends and how
//! responses and HTTP errors are mapped to `ServiceError`.

use serde_json::json;
use solace::ServiceError;
use solace::llm::message::Message;
use solace::llm::openai::{OpenAiClient, OpenAiConfig};
use solace::llm::provider::{LabelGenerator, ReplyGenerator};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig::new("test-key", "gpt-4o-mini").with_base_url(server.uri()))
}

// ── Request format ──────────────────────────────────────────────

#[tokio::test]
async fn reply_request_has_system_history_and_temperature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.75,
            "messages": [
                {"role": "system", "content": "be kind"},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
                {"role": "user", "content": "how are you"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Doing well.")))
        .expect(1)
        .mount(&server)
        .await;

    let history = [
        Message::user("hi"),
        Message::assistant("hello"),
        Message::user("how are you"),
    ];
    let reply = client(&server)
        .generate_reply("be kind", &history, 0.75)
        .await
        .unwrap();
    assert_eq!(reply, "Doing well.");
}

#[tokio::test]
async fn label_request_is_single_user_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "name this"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Quiet Evening")))
        .expect(1)
        .mount(&server)
        .await;

    let label = client(&server).generate_short_label("name this").await.unwrap();
    assert_eq!(label, "Quiet Evening");
}

#[tokio::test]
async fn max_tokens_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 128})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenAiConfig::new("test-key", "gpt-4o-mini")
        .with_base_url(server.uri())
        .with_max_tokens(128);
    let result = OpenAiClient::new(config)
        .generate_reply("sys", &[Message::user("x")], 0.6)
        .await;
    assert!(result.is_ok());
}

// ── Error mapping ───────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_reply("sys", &[Message::user("x")], 0.6)
        .await
        .unwrap_err();
    match err {
        ServiceError::AuthError(msg) => assert!(msg.contains("Incorrect API key")),
        other => unreachable!("expected AuthError, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_retryable_request_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_reply("sys", &[Message::user("x")], 0.6)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::RequestError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_reply("sys", &[Message::user("x")], 0.6)
        .await
        .unwrap_err();
    match err {
        ServiceError::ProviderError(msg) => assert!(msg.contains("500")),
        other => unreachable!("expected ProviderError, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_choices_is_response_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_reply("sys", &[Message::user("x")], 0.6)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ResponseError(_)));
}
