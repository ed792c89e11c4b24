//! Per-turn signal collection.
//!
//! Runs the text classifier (always) and the audio classifier (when audio
//! is supplied) under a time bound, and reduces each distribution to its
//! dominant entry. Failures never escape: a failed, timed-out or empty text
//! classification becomes [`EmotionSignal::neutral`], and the same for
//! audio becomes [`EmotionSignal::unknown`].

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::classifier::{AudioClassifier, TextClassifier};
use super::types::{AudioHandle, EmotionSignal, dominant};
use crate::observability::{FIELD_MODALITY, SPAN_CLASSIFY};

/// The dominant text and tone signals for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSignals {
    /// Dominant text emotion.
    pub text: EmotionSignal,
    /// Dominant tone emotion.
    pub tone: EmotionSignal,
}

/// Collects emotion signals from the configured classifiers.
pub struct SignalCollector {
    text: Arc<dyn TextClassifier>,
    audio: Option<Arc<dyn AudioClassifier>>,
    timeout: Duration,
}

impl SignalCollector {
    /// Create a collector. `audio` is `None` when speech classification is disabled.
    pub fn new(
        text: Arc<dyn TextClassifier>,
        audio: Option<Arc<dyn AudioClassifier>>,
        timeout: Duration,
    ) -> Self {
        Self {
            text,
            audio,
            timeout,
        }
    }

    /// Classify both modalities concurrently.
    pub async fn collect(&self, text: &str, audio: Option<&AudioHandle>) -> CollectedSignals {
        let (text, tone) = tokio::join!(self.collect_text(text), self.collect_tone(audio));
        CollectedSignals { text, tone }
    }

    /// Dominant text emotion, or `Neutral/0.0` on any failure.
    pub async fn collect_text(&self, text: &str) -> EmotionSignal {
        let span = tracing::info_span!(SPAN_CLASSIFY, { FIELD_MODALITY } = "text");
        let result = tokio::time::timeout(self.timeout, self.text.classify_text(text))
            .instrument(span)
            .await;
        match result {
            Ok(Ok(distribution)) => dominant(&distribution).unwrap_or_else(|| {
                tracing::debug!(classifier = self.text.name(), "empty text distribution");
                EmotionSignal::neutral()
            }),
            Ok(Err(e)) => {
                tracing::warn!(
                    classifier = self.text.name(),
                    error = %e,
                    "text classification failed"
                );
                EmotionSignal::neutral()
            }
            Err(_) => {
                tracing::warn!(
                    classifier = self.text.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "text classification timed out"
                );
                EmotionSignal::neutral()
            }
        }
    }

    /// Dominant tone emotion, or `Unknown/0.0` when there is no audio or on any failure.
    pub async fn collect_tone(&self, audio: Option<&AudioHandle>) -> EmotionSignal {
        let (Some(classifier), Some(audio)) = (self.audio.as_ref(), audio) else {
            return EmotionSignal::unknown();
        };
        let span = tracing::info_span!(SPAN_CLASSIFY, { FIELD_MODALITY } = "audio");
        let result = tokio::time::timeout(self.timeout, classifier.classify_audio(audio))
            .instrument(span)
            .await;
        match result {
            Ok(Ok(distribution)) => dominant(&distribution).unwrap_or_else(EmotionSignal::unknown),
            Ok(Err(e)) => {
                tracing::warn!(
                    classifier = classifier.name(),
                    error = %e,
                    "audio classification failed"
                );
                EmotionSignal::unknown()
            }
            Err(_) => {
                tracing::warn!(
                    classifier = classifier.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "audio classification timed out"
                );
                EmotionSignal::unknown()
            }
        }
    }
}
