//! Google Gemini `generateContent` adapter.
//!
//! Used for session titles by default. Assistant turns are sent with the
//! `model` role; the system instruction travels in `systemInstruction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::{Message, Role};
use super::provider::{LabelGenerator, ReplyGenerator};
use crate::error::ServiceError;

/// Configuration for the Gemini adapter.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter.
    pub api_key: String,
    /// Base URL (defaults to `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    /// The model to use.
    pub model: String,
    /// Maximum output tokens. `None` leaves it to the provider.
    pub max_output_tokens: Option<usize>,
}

impl GeminiConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: model.into(),
            max_output_tokens: None,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the output token limit.
    pub fn with_max_output_tokens(mut self, max: usize) -> Self {
        self.max_output_tokens = Some(max);
        self
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

// ── Request building ──────────────────────────────────────────

fn build_request(
    instructions: Option<&str>,
    history: &[Message],
    temperature: Option<f64>,
    max_output_tokens: Option<usize>,
) -> GenerateContentRequest {
    let mut system_text: Vec<&str> = instructions.into_iter().collect();
    let mut contents = Vec::with_capacity(history.len());
    for msg in history {
        let role = match msg.role {
            Role::System => {
                system_text.push(&msg.content);
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };
        contents.push(Content {
            role: Some(role),
            parts: vec![Part {
                text: msg.content.clone(),
            }],
        });
    }

    let system_instruction = (!system_text.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: system_text.join("\n\n"),
        }],
    });
    let generation_config = (temperature.is_some() || max_output_tokens.is_some()).then(|| {
        GenerationConfig {
            temperature,
            max_output_tokens,
        }
    });

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

// ── Response parsing ──────────────────────────────────────────

fn parse_response(body: &str) -> Result<String, ServiceError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        ServiceError::ResponseError(format!("Gemini response was not valid JSON: {e}"))
    })?;
    let texts: Vec<String> = parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if texts.is_empty() {
        return Err(ServiceError::ResponseError(
            "Gemini returned no text in the response candidates".into(),
        ));
    }
    Ok(texts.concat())
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => ServiceError::AuthError(format!("Gemini authentication failed: {message}")),
        429 => ServiceError::RequestError(format!("Gemini rate limited: {message}")),
        _ => ServiceError::ProviderError(format!(
            "Gemini HTTP {}: {message}",
            status.as_u16()
        )),
    }
}

// ── Client ────────────────────────────────────────────────────

/// Gemini `generateContent` client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::RequestError(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            ServiceError::RequestError(format!("failed to read Gemini response: {e}"))
        })?;
        if !status.is_success() {
            return Err(map_http_error(status, &body_text));
        }
        parse_response(&body_text)
    }
}

#[async_trait]
impl ReplyGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
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
            "sending Gemini request"
        );
        let body = build_request(
            Some(instructions),
            history,
            Some(temperature),
            self.config.max_output_tokens,
        );
        self.send_request(&body).await
    }
}

#[async_trait]
impl LabelGenerator for GeminiClient {
    async fn generate_short_label(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = build_request(
            None,
            &[Message::user(prompt)],
            None,
            self.config.max_output_tokens,
        );
        self.send_request(&body).await
    }
}
