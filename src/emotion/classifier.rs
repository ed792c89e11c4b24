//! Classifier traits for the text and audio modalities.
//!
//! Implementations return the full label distribution in the classifier's
//! own order; reduction to a dominant label happens in the collector.

use async_trait::async_trait;

use super::types::{AudioHandle, EmotionSignal};
use crate::error::ServiceError;

/// Text emotion classifier.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Short backend name for logs (e.g. `"lexicon"`, `"huggingface"`).
    fn name(&self) -> &str;

    /// Classify `text` into an ordered label distribution.
    async fn classify_text(&self, text: &str) -> Result<Vec<EmotionSignal>, ServiceError>;
}

/// Speech (tone) emotion classifier.
#[async_trait]
pub trait AudioClassifier: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Classify the audio behind `audio` into an ordered label distribution.
    async fn classify_audio(&self, audio: &AudioHandle)
    -> Result<Vec<EmotionSignal>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn classifiers_are_object_safe() {
        fn _takes_text(_c: Arc<dyn TextClassifier>) {}
        fn _takes_audio(_c: Arc<dyn AudioClassifier>) {}
    }
}
