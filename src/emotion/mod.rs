//! Emotion signals: classifiers, per-turn collection and fusion.

pub mod classifier;
pub mod collector;
pub mod fusion;
pub mod huggingface;
pub mod lexicon;
pub mod types;

pub use classifier::{AudioClassifier, TextClassifier};
pub use collector::{CollectedSignals, SignalCollector};
pub use fusion::{FusionOutcome, temperature_for, tone_directive};
pub use huggingface::{HuggingFaceClassifier, HuggingFaceConfig};
pub use lexicon::LexiconClassifier;
pub use types::{AudioHandle, EmotionSignal, NEUTRAL_LABEL, UNKNOWN_LABEL, dominant};
