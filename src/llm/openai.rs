//! OpenAI Chat Completions adapter.
//!
//! Non-streaming `/v1/chat/completions` calls. The system instruction is
//! sent as the first message, followed by the conversation history.
//!
//! ```rust,no_run
//! use solace::llm::openai::{OpenAiClient, OpenAiConfig};
//! use solace::llm::provider::ReplyGenerator;
//! use solace::llm::message::Message;
//!
//! # async fn example() -> Result<(), solace::ServiceError> {
//! let client = OpenAiClient::new(OpenAiConfig::new("sk-...", "gpt-4o-mini"));
//! let reply = client
//!     .generate_reply("Be kind.", &[Message::user("Hello")], 0.6)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::Deserialize;

use super::message::{Message, Role};
use super::provider::{LabelGenerator, ReplyGenerator};
use crate::error::ServiceError;

// ── Configuration ─────────────────────────────────────────────

/// Configuration for the OpenAI adapter.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL (defaults to `https://api.openai.com`).
    pub base_url: String,
    /// The model to use.
    pub model: String,
    /// Maximum tokens per completion. `None` leaves it to the provider.
    pub max_tokens: Option<usize>,
}

impl OpenAiConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".into(),
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// ── Request Builders ──────────────────────────────────────────

/// Build the JSON request body for the Chat Completions API.
pub fn build_completions_request(
    model: &str,
    instructions: Option<&str>,
    history: &[Message],
    temperature: Option<f64>,
    max_tokens: Option<usize>,
) -> serde_json::Value {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if let Some(instructions) = instructions {
        messages.push(message_to_openai(&Message::system(instructions)));
    }
    messages.extend(history.iter().map(message_to_openai));

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
    });
    if let Some(obj) = body.as_object_mut() {
        if let Some(temperature) = temperature {
            obj.insert("temperature".into(), serde_json::json!(temperature));
        }
        if let Some(max_tokens) = max_tokens {
            obj.insert("max_tokens".into(), serde_json::json!(max_tokens));
        }
    }
    body
}

/// Convert a single message to OpenAI format.
fn message_to_openai(msg: &Message) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    serde_json::json!({
        "role": role,
        "content": msg.content,
    })
}

// ── Response Parsing ──────────────────────────────────────────

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Extract the first choice's content from a completion response body.
fn parse_completion(body: &str) -> Result<String, ServiceError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        ServiceError::ResponseError(format!("OpenAI response was not valid JSON: {e}"))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ServiceError::ResponseError("OpenAI response contained no content".into()))
}

/// Extract an error message from an OpenAI error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Map a non-success HTTP status to a [`ServiceError`].
fn map_http_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ServiceError::AuthError(format!("OpenAI authentication failed: {message}")),
        429 => ServiceError::RequestError(format!("OpenAI rate limited: {message}")),
        _ => ServiceError::ProviderError(format!(
            "OpenAI HTTP {}: {message}",
            status.as_u16()
        )),
    }
}

// ── Client ────────────────────────────────────────────────────

/// OpenAI Chat Completions client.
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, body: serde_json::Value) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::RequestError(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            ServiceError::RequestError(format!("failed to read OpenAI response: {e}"))
        })?;
        if !status.is_success() {
            return Err(map_http_error(status, &body_text));
        }
        parse_completion(&body_text)
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_reply(
        &self,
        instructions: &str,
        history: &[Message],
        temperature: f64,
    ) -> Result<String, ServiceError> {
        tracing::debug!(
            model = %self.config.model,
            messages = history.len(),
            "sending OpenAI completion"
        );
        let body = build_completions_request(
            &self.config.model,
            Some(instructions),
            history,
            Some(temperature),
            self.config.max_tokens,
        );
        self.complete(body).await
    }
}

#[async_trait]
impl LabelGenerator for OpenAiClient {
    async fn generate_short_label(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = build_completions_request(
            &self.config.model,
            None,
            &[Message::user(prompt)],
            None,
            self.config.max_tokens,
        );
        self.complete(body).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    // ── OpenAiConfig ──────────────────────────────────────────

    #[test]
    fn config_new() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o-mini");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://api.openai.com");
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn config_builders() {
        let config = OpenAiConfig::new("key", "model")
            .with_base_url("https://custom.api.com")
            .with_max_tokens(256);
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.max_tokens, Some(256));
    }

    // ── Request building ──────────────────────────────────────

    #[test]
    fn request_puts_system_first() {
        let history = [Message::user("hi"), Message::assistant(""), Message::user("again")];
        let body = build_completions_request("m", Some("be kind"), &history, Some(0.6), None);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be kind");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "");
        assert_eq!(body["temperature"], 0.6);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn label_request_has_no_system_or_temperature() {
        let body = build_completions_request("m", None, &[Message::user("p")], None, Some(20));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_tokens"], 20);
    }

    // ── Response parsing ──────────────────────────────────────

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Hello!");
    }

    #[test]
    fn empty_choices_is_response_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.code(), "RESPONSE_INVALID");
    }

    #[test]
    fn invalid_json_is_response_error() {
        assert_eq!(parse_completion("nope").unwrap_err().code(), "RESPONSE_INVALID");
    }

    // ── Error mapping ─────────────────────────────────────────

    #[test]
    fn error_message_from_json_body() {
        let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid API key");
        assert_eq!(extract_error_message("plain"), "plain");
    }

    #[test]
    fn http_status_mapping() {
        let auth = map_http_error(reqwest::StatusCode::UNAUTHORIZED, "{}");
        assert_eq!(auth.code(), "AUTH_FAILED");
        let forbidden = map_http_error(reqwest::StatusCode::FORBIDDEN, "{}");
        assert_eq!(forbidden.code(), "AUTH_FAILED");
        let limited = map_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "{}");
        assert_eq!(limited.code(), "REQUEST_FAILED");
        assert!(limited.is_retryable());
        let server = map_http_error(reqwest::StatusCode::BAD_GATEWAY, "{}");
        assert_eq!(server.code(), "PROVIDER_ERROR");
        assert!(server.message().contains("502"));
    }
}
