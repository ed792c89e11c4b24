//! Per-turn orchestration.
//!
//! ```text
//! validate ─> collect signals ─> fuse ─> crisis check
//!                                          │
//!                 ┌──── bypass ────────────┤
//!                 │                        └─> read history ─> assemble ─> generate
//!                 ▼                                                          │
//!              persist interaction <─────────────────────────────────────────┘
//!                 │
//!                 └─> title check ─> TurnOutcome
//! ```
//!
//! Every collaborator failure is absorbed by its own stage. Only malformed
//! input is returned to the caller as an error.

use std::sync::Arc;

use tracing::Instrument;

use super::messages::{TurnOutcome, TurnRequest, validate_turn_input};
use crate::config::SolaceConfig;
use crate::context::{ContextAssembler, HistoryWindow};
use crate::crisis::{CRISIS_REPLY, CrisisDetector};
use crate::emotion::{
    AudioClassifier, AudioHandle, FusionOutcome, SignalCollector, TextClassifier,
};
use crate::error::Result;
use crate::llm::generator::{GeneratedReply, ResponseGenerator};
use crate::llm::provider::{LabelGenerator, ReplyGenerator};
use crate::observability::{FIELD_OPERATION, FIELD_SESSION_ID, FIELD_USER_ID, SPAN_STORE, SPAN_TURN};
use crate::store::{ConversationStore, Interaction};
use crate::title::SessionTitleManager;

/// External dependencies of the pipeline, constructed once by the host.
#[derive(Clone)]
pub struct Collaborators {
    /// Text emotion classifier.
    pub text_classifier: Arc<dyn TextClassifier>,
    /// Speech emotion classifier; `None` disables the audio modality.
    pub audio_classifier: Option<Arc<dyn AudioClassifier>>,
    /// Main reply model.
    pub reply_generator: Arc<dyn ReplyGenerator>,
    /// Lightweight model used for session titles.
    pub label_generator: Arc<dyn LabelGenerator>,
    /// Session and interaction persistence.
    pub store: Arc<dyn ConversationStore>,
}

/// Runs the per-turn pipeline. Holds no mutable state; safe to share
/// across concurrent turns.
pub struct TurnOrchestrator {
    collector: SignalCollector,
    assembler: ContextAssembler,
    crisis: CrisisDetector,
    generator: ResponseGenerator,
    titles: SessionTitleManager,
    store: Arc<dyn ConversationStore>,
}

impl TurnOrchestrator {
    /// Wire the stages from `collaborators` and `config`.
    pub fn new(collaborators: Collaborators, config: &SolaceConfig) -> Self {
        let audio = if config.emotion.audio_enabled {
            collaborators.audio_classifier
        } else {
            None
        };
        Self {
            collector: SignalCollector::new(
                collaborators.text_classifier,
                audio,
                config.timeouts.classifier(),
            ),
            assembler: ContextAssembler::new(HistoryWindow::from_max_interactions(
                config.history.max_interactions,
            )),
            crisis: CrisisDetector::from_config(&config.crisis),
            generator: ResponseGenerator::new(
                collaborators.reply_generator,
                config.timeouts.generation(),
            ),
            titles: SessionTitleManager::new(
                collaborators.label_generator,
                Arc::clone(&collaborators.store),
                config.timeouts.title(),
                config.title.max_words,
            ),
            store: collaborators.store,
        }
    }

    /// The session store shared with the stages.
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Run one turn from a [`TurnRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`SolaceError::InvalidInput`](crate::SolaceError::InvalidInput)
    /// for blank identifiers or text.
    pub async fn handle(&self, request: &TurnRequest) -> Result<TurnOutcome> {
        let audio = request.audio();
        self.process_turn(
            &request.user_id,
            &request.session_id,
            &request.text,
            audio.as_ref(),
        )
        .await
    }

    /// Run one turn.
    ///
    /// # Errors
    ///
    /// Returns [`SolaceError::InvalidInput`](crate::SolaceError::InvalidInput)
    /// for blank identifiers or text. No other error is returned.
    pub async fn process_turn(
        &self,
        user_id: &str,
        session_id: &str,
        user_text: &str,
        audio: Option<&AudioHandle>,
    ) -> Result<TurnOutcome> {
        validate_turn_input(user_id, session_id, user_text)?;
        let span = tracing::info_span!(
            SPAN_TURN,
            { FIELD_USER_ID } = user_id,
            { FIELD_SESSION_ID } = session_id,
            has_audio = audio.is_some(),
        );
        Ok(self
            .run(user_id, session_id, user_text, audio)
            .instrument(span)
            .await)
    }

    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        user_text: &str,
        audio: Option<&AudioHandle>,
    ) -> TurnOutcome {
        let signals = self.collector.collect(user_text, audio).await;
        let fusion = FusionOutcome::from_signal(&signals.text);
        tracing::debug!(
            text_label = %signals.text.label,
            text_score = signals.text.score,
            tone_label = %signals.tone.label,
            temperature = fusion.temperature,
            "signals fused"
        );

        let crisis = self.crisis.check(user_text, &signals.text);
        let reply = match &crisis {
            Some(trigger) => {
                tracing::warn!(?trigger, "crisis bypass triggered; skipping generation");
                GeneratedReply {
                    text: CRISIS_REPLY.to_owned(),
                    degraded: false,
                }
            }
            None => {
                let history = self.load_history(user_id, session_id).await;
                let context = self.assembler.assemble(&history, user_text, &fusion);
                self.generator.generate(&context).await
            }
        };

        self.persist(
            user_id,
            session_id,
            Interaction::new(
                user_text,
                reply.text.clone(),
                signals.text.clone(),
                signals.tone.clone(),
            ),
        )
        .await;

        // Crisis text and fallback replies are never sent to the label model.
        let title = if crisis.is_some() || reply.degraded {
            self.titles.current(user_id, session_id).await
        } else {
            self.titles
                .ensure_title(user_id, session_id, user_text, &reply.text)
                .await
                .title()
                .map(str::to_owned)
        };

        tracing::info!(
            label = %signals.text.label,
            score = signals.text.score,
            temperature = fusion.temperature,
            crisis = crisis.is_some(),
            degraded = reply.degraded,
            reply_len = reply.text.len(),
            titled = title.is_some(),
            "turn complete"
        );

        TurnOutcome {
            reply: reply.text,
            text_emotion: signals.text,
            tone_emotion: signals.tone,
            title,
            temperature: fusion.temperature,
            crisis: crisis.is_some(),
            degraded: reply.degraded,
        }
    }

    /// Prior interactions, or none if the store cannot be read.
    async fn load_history(&self, user_id: &str, session_id: &str) -> Vec<Interaction> {
        let span = tracing::info_span!(SPAN_STORE, { FIELD_OPERATION } = "history");
        match self
            .store
            .get_interactions(user_id, session_id)
            .instrument(span)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read history; continuing without it");
                Vec::new()
            }
        }
    }

    async fn persist(&self, user_id: &str, session_id: &str, interaction: Interaction) {
        let span = tracing::info_span!(SPAN_STORE, { FIELD_OPERATION } = "append");
        if let Err(e) = self
            .store
            .append_interaction(user_id, session_id, interaction)
            .instrument(span)
            .await
        {
            tracing::warn!(error = %e, "failed to persist interaction");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::emotion::LexiconClassifier;
    use crate::error::{ServiceError, SolaceError};
    use crate::llm::message::Message;
    use crate::store::MemoryConversationStore;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ReplyGenerator for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        async fn generate_reply(
            &self,
            _instructions: &str,
            history: &[Message],
            _temperature: f64,
        ) -> std::result::Result<String, ServiceError> {
            Ok(format!("heard {} messages", history.len()))
        }
    }

    #[async_trait]
    impl LabelGenerator for Echo {
        async fn generate_short_label(
            &self,
            _prompt: &str,
        ) -> std::result::Result<String, ServiceError> {
            Ok("Small Talk".into())
        }
    }

    fn orchestrator() -> TurnOrchestrator {
        TurnOrchestrator::new(
            Collaborators {
                text_classifier: Arc::new(LexiconClassifier::new()),
                audio_classifier: None,
                reply_generator: Arc::new(Echo),
                label_generator: Arc::new(Echo),
                store: Arc::new(MemoryConversationStore::new()),
            },
            &SolaceConfig::default(),
        )
    }

    #[test]
    fn orchestrator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TurnOrchestrator>();
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_any_stage() {
        let orch = orchestrator();
        let err = orch.process_turn("u1", "s1", "   ", None).await.unwrap_err();
        assert!(matches!(err, SolaceError::InvalidInput(_)));
        assert!(orch.store().get_interactions("u1", "s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_grows_across_turns() {
        let orch = orchestrator();
        let first = orch.process_turn("u1", "s1", "hello", None).await.unwrap();
        assert_eq!(first.reply, "heard 1 messages");
        assert_eq!(first.title.as_deref(), Some("Small Talk"));
        let second = orch.process_turn("u1", "s1", "hello again", None).await.unwrap();
        assert_eq!(second.reply, "heard 3 messages");
    }

    #[tokio::test]
    async fn handle_uses_request_fields() {
        let orch = orchestrator();
        let outcome = orch
            .handle(&TurnRequest::new("u1", "s2", "I'm so happy today"))
            .await
            .unwrap();
        assert_eq!(outcome.text_emotion.label, "joy");
        assert_eq!(outcome.tone_emotion.label, "Unknown");
    }
}
