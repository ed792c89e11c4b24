//! Crisis detection.
//!
//! Checked before any generation call. A triggered turn gets the fixed
//! [`CRISIS_REPLY`] instead of model output.

use crate::config::CrisisConfig;
use crate::emotion::EmotionSignal;

/// Built-in high-risk phrases, matched as case-insensitive substrings.
pub const HIGH_RISK_PHRASES: &[&str] = &[
    "kill myself",
    "killing myself",
    "want to die",
    "end my life",
    "ending my life",
    "take my own life",
    "suicide",
    "suicidal",
    "self harm",
    "self-harm",
    "hurt myself",
    "no reason to live",
    "better off dead",
];

/// Emotion labels that trigger the bypass at or above the score threshold.
pub const HIGH_RISK_LABELS: &[&str] = &["sadness", "fear", "depression"];

/// Default score threshold for [`HIGH_RISK_LABELS`].
pub const DEFAULT_EMOTION_THRESHOLD: f32 = 0.6;

/// Fixed reply returned when the bypass fires.
pub const CRISIS_REPLY: &str = "It sounds like you're carrying something really heavy right now, \
and I'm glad you told me. I'm not able to give you the support you deserve in this moment, \
but please reach out to someone you trust or a mental health professional. \
If you are in immediate danger, contact your local emergency number or a crisis line right away.";

/// Why the bypass fired.
#[derive(Debug, Clone, PartialEq)]
pub enum CrisisTrigger {
    /// The input contained a high-risk phrase.
    Phrase(String),
    /// The dominant emotion was high-risk with a score at or above threshold.
    Emotion {
        /// The dominant label.
        label: String,
        /// Its score.
        score: f32,
    },
}

/// Decides whether a turn signals acute risk.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    phrases: Vec<String>,
    threshold: f32,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self::new(&[], DEFAULT_EMOTION_THRESHOLD)
    }
}

impl CrisisDetector {
    /// Built-in phrases plus `extra_phrases`, with the given emotion threshold.
    pub fn new(extra_phrases: &[String], threshold: f32) -> Self {
        let phrases = HIGH_RISK_PHRASES
            .iter()
            .map(|p| (*p).to_owned())
            .chain(
                extra_phrases
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty()),
            )
            .collect();
        Self { phrases, threshold }
    }

    /// Build from configuration.
    pub fn from_config(config: &CrisisConfig) -> Self {
        Self::new(&config.extra_phrases, config.emotion_threshold)
    }

    /// Returns the first matching trigger, or `None`.
    pub fn check(&self, user_input: &str, text_emotion: &EmotionSignal) -> Option<CrisisTrigger> {
        let lower = user_input.to_lowercase();
        if let Some(phrase) = self.phrases.iter().find(|p| lower.contains(p.as_str())) {
            return Some(CrisisTrigger::Phrase(phrase.clone()));
        }
        let risky_label = HIGH_RISK_LABELS
            .iter()
            .any(|label| text_emotion.has_label(label));
        if risky_label && text_emotion.score >= self.threshold {
            return Some(CrisisTrigger::Emotion {
                label: text_emotion.label.clone(),
                score: text_emotion.score,
            });
        }
        None
    }

    /// Whether the bypass fires for this turn.
    pub fn is_crisis(&self, user_input: &str, text_emotion: &EmotionSignal) -> bool {
        self.check(user_input, text_emotion).is_some()
    }
}
