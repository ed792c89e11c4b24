//! Host command handler and collaborator wiring.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::config::{EmotionBackend, ModelProvider, SolaceConfig, StoreBackend};
use crate::emotion::{
    AudioClassifier, HuggingFaceClassifier, HuggingFaceConfig, LexiconClassifier, TextClassifier,
};
use crate::error::{Result, SolaceError};
use crate::host::contract::{
    CommandEnvelope, CommandName, ResponseEnvelope, SessionPayload, TurnPayload, UserPayload,
};
use crate::llm::gemini::{GeminiClient, GeminiConfig};
use crate::llm::openai::{OpenAiClient, OpenAiConfig};
use crate::llm::provider::{LabelGenerator, ReplyGenerator};
use crate::pipeline::{Collaborators, TurnOrchestrator, TurnRequest};
use crate::store::{ConversationStore, FsConversationStore, MemoryConversationStore};

/// Resolve the base URL for a provider, honoring an override.
fn base_url(api_url: &str, provider: ModelProvider) -> String {
    if api_url.trim().is_empty() {
        provider.default_base_url().to_owned()
    } else {
        api_url.trim().to_owned()
    }
}

fn model_client(
    provider: ModelProvider,
    api_url: &str,
    api_key: &str,
    model: &str,
    max_tokens: usize,
) -> (Arc<dyn ReplyGenerator>, Arc<dyn LabelGenerator>) {
    if api_key.is_empty() {
        warn!(?provider, model, "no API key configured; model calls will fail and degrade");
    }
    let url = base_url(api_url, provider);
    match provider {
        ModelProvider::OpenAi => {
            let mut config = OpenAiConfig::new(api_key, model).with_base_url(url);
            if max_tokens > 0 {
                config = config.with_max_tokens(max_tokens);
            }
            let client = Arc::new(OpenAiClient::new(config));
            let reply: Arc<dyn ReplyGenerator> = client.clone();
            let label: Arc<dyn LabelGenerator> = client;
            (reply, label)
        }
        ModelProvider::Gemini => {
            let mut config = GeminiConfig::new(api_key, model).with_base_url(url);
            if max_tokens > 0 {
                config = config.with_max_output_tokens(max_tokens);
            }
            let client = Arc::new(GeminiClient::new(config));
            let reply: Arc<dyn ReplyGenerator> = client.clone();
            let label: Arc<dyn LabelGenerator> = client;
            (reply, label)
        }
    }
}

/// Construct the pipeline's collaborators from configuration.
///
/// # Errors
///
/// Returns an error if the filesystem store directory cannot be created.
pub fn build_collaborators(config: &SolaceConfig) -> Result<Collaborators> {
    let (text_classifier, audio_classifier): (
        Arc<dyn TextClassifier>,
        Option<Arc<dyn AudioClassifier>>,
    ) = match config.emotion.backend {
        EmotionBackend::Lexicon => {
            if config.emotion.audio_enabled {
                info!("lexicon backend has no speech model; tone will be reported as Unknown");
            }
            let text: Arc<dyn TextClassifier> = Arc::new(LexiconClassifier::new());
            (text, None)
        }
        EmotionBackend::HuggingFace => {
            let hf = Arc::new(HuggingFaceClassifier::new(
                HuggingFaceConfig::new(&config.emotion.text_model, &config.emotion.audio_model)
                    .with_base_url(&config.emotion.api_url)
                    .with_api_token(&config.emotion.api_token),
            ));
            let text: Arc<dyn TextClassifier> = hf.clone();
            (text, Some(hf as Arc<dyn AudioClassifier>))
        }
    };

    let (reply_generator, _) = model_client(
        config.llm.provider,
        &config.llm.api_url,
        &config.llm.api_key,
        &config.llm.model,
        config.llm.max_tokens,
    );
    let (_, label_generator) = model_client(
        config.title.provider,
        &config.title.api_url,
        &config.title.api_key,
        &config.title.model,
        0,
    );

    let store: Arc<dyn ConversationStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryConversationStore::new()),
        StoreBackend::Fs => {
            let dir = config.store.effective_data_dir();
            info!(path = %dir.display(), "using filesystem session store");
            Arc::new(FsConversationStore::new(dir)?)
        }
    };

    Ok(Collaborators {
        text_classifier,
        audio_classifier,
        reply_generator,
        label_generator,
        store,
    })
}

fn parse_payload<T: DeserializeOwned>(op: CommandName, payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| SolaceError::InvalidInput(format!("invalid {} payload: {e}", op.as_str())))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SolaceError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| SolaceError::Io(e.into()))
}

/// Dispatches host commands to the orchestrator and store.
pub struct HostHandler {
    orchestrator: TurnOrchestrator,
}

impl HostHandler {
    /// Wrap an orchestrator.
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Build collaborators and the orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot be opened.
    pub fn from_config(config: &SolaceConfig) -> Result<Self> {
        config.validate()?;
        let collaborators = build_collaborators(config)?;
        Ok(Self::new(TurnOrchestrator::new(collaborators, config)))
    }

    /// Run one command. Failures become `ok: false` responses.
    pub async fn handle(&self, envelope: CommandEnvelope) -> ResponseEnvelope {
        let request_id = envelope.request_id.clone();
        let op = envelope.op;
        match self.dispatch(envelope).await {
            Ok(payload) => ResponseEnvelope::ok(request_id, payload),
            Err(e) => {
                warn!(
                    op = op.as_str(),
                    request_id = %request_id,
                    error = %e,
                    "host command failed"
                );
                ResponseEnvelope::error(request_id, e.to_string())
            }
        }
    }

    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<serde_json::Value> {
        let store = self.orchestrator.store();
        match envelope.op {
            CommandName::NewSession => {
                let p: UserPayload = parse_payload(envelope.op, envelope.payload)?;
                require("user_id", &p.user_id)?;
                let id = store.create_session(&p.user_id).await?;
                let meta = store.get_session(&p.user_id, &id).await?;
                Ok(serde_json::json!({ "session_id": id, "session": to_payload(&meta)? }))
            }
            CommandName::Turn => {
                let p: TurnPayload = parse_payload(envelope.op, envelope.payload)?;
                let mut request = TurnRequest::new(p.user_id, p.session_id, p.text);
                request.audio_path = p.audio_path;
                let outcome = self.orchestrator.handle(&request).await?;
                to_payload(&outcome)
            }
            CommandName::ListSessions => {
                let p: UserPayload = parse_payload(envelope.op, envelope.payload)?;
                require("user_id", &p.user_id)?;
                let sessions = store.list_sessions(&p.user_id).await?;
                Ok(serde_json::json!({ "sessions": to_payload(&sessions)? }))
            }
            CommandName::History => {
                let p: SessionPayload = parse_payload(envelope.op, envelope.payload)?;
                require("user_id", &p.user_id)?;
                require("session_id", &p.session_id)?;
                let interactions = store.get_interactions(&p.user_id, &p.session_id).await?;
                Ok(serde_json::json!({
                    "session_id": p.session_id,
                    "interactions": to_payload(&interactions)?,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;

    fn handler() -> HostHandler {
        HostHandler::from_config(&SolaceConfig::default()).unwrap()
    }

    #[test]
    fn base_url_override() {
        assert_eq!(base_url("", ModelProvider::OpenAi), "https://api.openai.com");
        assert_eq!(
            base_url(" http://localhost:8080 ", ModelProvider::Gemini),
            "http://localhost:8080"
        );
    }

    #[test]
    fn default_config_builds_lexicon_and_memory_store() {
        let collaborators = build_collaborators(&SolaceConfig::default()).unwrap();
        assert_eq!(collaborators.text_classifier.name(), "lexicon");
        assert!(collaborators.audio_classifier.is_none());
        assert_eq!(collaborators.reply_generator.name(), "openai");
    }

    #[test]
    fn huggingface_backend_enables_audio() {
        let mut config = SolaceConfig::default();
        config.emotion.backend = EmotionBackend::HuggingFace;
        let collaborators = build_collaborators(&config).unwrap();
        assert_eq!(collaborators.text_classifier.name(), "huggingface");
        assert!(collaborators.audio_classifier.is_some());
    }

    #[test]
    fn fs_backend_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SolaceConfig::default();
        config.store.backend = StoreBackend::Fs;
        config.store.data_dir = Some(dir.path().join("sessions"));
        build_collaborators(&config).unwrap();
        assert!(dir.path().join("sessions").is_dir());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SolaceConfig::default();
        config.title.max_words = 0;
        assert!(HostHandler::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn new_session_then_list() {
        let h = handler();
        let created = h
            .handle(CommandEnvelope::new("r1", CommandName::NewSession, json!({"user_id": "u1"})))
            .await;
        assert!(created.ok, "{created:?}");
        let payload = created.payload.unwrap();
        let id = payload["session_id"].as_str().unwrap().to_owned();
        assert_eq!(payload["session"]["title"], "untitled");

        let listed = h
            .handle(CommandEnvelope::new("r2", CommandName::ListSessions, json!({"user_id": "u1"})))
            .await;
        assert_eq!(listed.request_id, "r2");
        assert_eq!(listed.payload.unwrap()["sessions"][0]["id"], id);
    }

    #[tokio::test]
    async fn bad_payload_is_error_response() {
        let resp = handler()
            .handle(CommandEnvelope::new("r1", CommandName::Turn, json!({"user_id": "u1"})))
            .await;
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("invalid turn payload"));
    }

    #[tokio::test]
    async fn blank_turn_text_is_error_response() {
        let resp = handler()
            .handle(CommandEnvelope::new(
                "r1",
                CommandName::Turn,
                json!({"user_id": "u1", "session_id": "s1", "text": " "}),
            ))
            .await;
        assert!(!resp.ok);
        assert!(resp.error.unwrap().contains("invalid input"));
    }

    #[tokio::test]
    async fn history_of_unknown_session_is_empty() {
        let resp = handler()
            .handle(CommandEnvelope::new(
                "r1",
                CommandName::History,
                json!({"user_id": "u1", "session_id": "nope"}),
            ))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload.unwrap()["interactions"], json!([]));
    }
}
