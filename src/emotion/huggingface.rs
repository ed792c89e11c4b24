//! Hugging Face hosted inference classifier.
//!
//! Text is posted as `{"inputs": "<text>"}`; audio is posted as the raw
//! encoded payload with its MIME type. Both endpoints answer with a label
//! distribution, either flat (`[{label, score}, ...]`) or nested one level
//! (`[[{label, score}, ...]]`). Both shapes are accepted.

use async_trait::async_trait;
use serde::Deserialize;

use super::classifier::{AudioClassifier, TextClassifier};
use super::types::{AudioHandle, EmotionSignal};
use crate::error::ServiceError;

/// Configuration for [`HuggingFaceClassifier`].
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// Inference API base URL.
    pub base_url: String,
    /// Bearer token. Empty sends no `Authorization` header.
    pub api_token: String,
    /// Model repo ID for text classification.
    pub text_model: String,
    /// Model repo ID for speech classification.
    pub audio_model: String,
}

impl HuggingFaceConfig {
    /// Create a config for the public inference endpoint.
    pub fn new(text_model: impl Into<String>, audio_model: impl Into<String>) -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".into(),
            api_token: String::new(),
            text_model: text_model.into(),
            audio_model: audio_model.into(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = token.into();
        self
    }
}

/// Text and speech emotion classifier backed by the Hugging Face inference API.
pub struct HuggingFaceClassifier {
    config: HuggingFaceConfig,
    client: reqwest::Client,
}

impl HuggingFaceClassifier {
    /// Create a new classifier.
    pub fn new(config: HuggingFaceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!(
            "{}/models/{model}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_token.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.config.api_token))
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<EmotionSignal>, ServiceError> {
        let response = request.send().await.map_err(|e| {
            ServiceError::RequestError(format!("inference request failed: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ServiceError::RequestError(format!("failed to read inference response: {e}"))
        })?;
        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }
        parse_distribution(&body)
    }
}

/// Map a non-success HTTP status to a [`ServiceError`].
fn map_http_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ServiceError::AuthError(format!("inference authentication failed: {message}")),
        429 => ServiceError::RequestError(format!("inference rate limited: {message}")),
        _ => ServiceError::ProviderError(format!(
            "inference HTTP {}: {message}",
            status.as_u16()
        )),
    }
}

/// The inference API reports errors as `{"error": "..."}`.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Distribution {
    Nested(Vec<Vec<EmotionSignal>>),
    Flat(Vec<EmotionSignal>),
}

/// Parse a flat or nested label distribution.
fn parse_distribution(body: &str) -> Result<Vec<EmotionSignal>, ServiceError> {
    let parsed: Distribution = serde_json::from_str(body).map_err(|e| {
        ServiceError::ResponseError(format!("unexpected inference response: {e}"))
    })?;
    let entries = match parsed {
        Distribution::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
        Distribution::Flat(entries) => entries,
    };
    Ok(entries
        .into_iter()
        .map(|e| EmotionSignal::new(e.label, e.score))
        .collect())
}

#[async_trait]
impl TextClassifier for HuggingFaceClassifier {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn classify_text(&self, text: &str) -> Result<Vec<EmotionSignal>, ServiceError> {
        let request = self
            .client
            .post(self.model_url(&self.config.text_model))
            .json(&serde_json::json!({ "inputs": text }));
        self.execute(self.authorize(request)).await
    }
}

#[async_trait]
impl AudioClassifier for HuggingFaceClassifier {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn classify_audio(
        &self,
        audio: &AudioHandle,
    ) -> Result<Vec<EmotionSignal>, ServiceError> {
        let (data, content_type) = audio.load().await?;
        let request = self
            .client
            .post(self.model_url(&self.config.audio_model))
            .header("Content-Type", content_type)
            .body(data);
        self.execute(self.authorize(request)).await
    }
}
