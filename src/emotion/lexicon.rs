//! Offline keyword classifier for text emotion.
//!
//! Produces a distribution over the seven labels used by the hosted text
//! model (`anger`, `disgust`, `fear`, `joy`, `neutral`, `sadness`,
//! `surprise`) from a fast keyword scan. Keywords match whole words, and
//! multi-word keywords match consecutive words. Scores are independent
//! confidences, not a normalized probability distribution.
//!
//! Used when no hosted classifier is configured, and as a deterministic
//! classifier in tests.

use async_trait::async_trait;

use super::classifier::TextClassifier;
use super::types::EmotionSignal;
use crate::error::ServiceError;

/// Score given to `neutral` regardless of keyword hits.
///
/// Low enough that any single keyword hit on another label dominates, and
/// that purely neutral text maps to the most conservative temperature band.
pub const NEUTRAL_BASELINE: f32 = 0.1;

// ── Keyword tables ──────────────────────────────────────────────────────

/// (label, keywords) in classifier output order. `neutral` is inserted
/// between `joy` and `sadness` when the distribution is built.
const LABEL_TABLE: &[(&str, &[&str])] = &[
    (
        "anger",
        &[
            "angry",
            "furious",
            "mad at",
            "hate",
            "hated",
            "hates",
            "annoyed",
            "irritated",
            "pissed",
            "rage",
            "fed up",
            "frustrated",
        ],
    ),
    (
        "disgust",
        &[
            "disgusting",
            "disgusted",
            "gross",
            "revolting",
            "sickening",
            "repulsive",
            "nasty",
            "vile",
        ],
    ),
    (
        "fear",
        &[
            "afraid",
            "scared",
            "terrified",
            "anxious",
            "anxiety",
            "panic",
            "worried",
            "nervous",
            "frightened",
            "dread",
        ],
    ),
    (
        "joy",
        &[
            "happy",
            "glad",
            "excited",
            "great",
            "wonderful",
            "love",
            "grateful",
            "thrilled",
            "amazing",
            "proud",
        ],
    ),
    (
        "sadness",
        &[
            "sad",
            "lonely",
            "depressed",
            "hopeless",
            "crying",
            "cried",
            "miserable",
            "heartbroken",
            "grief",
            "empty inside",
        ],
    ),
    (
        "surprise",
        &[
            "surprised",
            "shocked",
            "can't believe",
            "unexpected",
            "no way",
            "astonished",
            "wow",
            "out of nowhere",
        ],
    ),
];

/// Keyword-lexicon text classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    /// Create a new lexicon classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify synchronously.
    pub fn distribution(&self, text: &str) -> Vec<EmotionSignal> {
        let words = tokenize(text);
        let mut out = Vec::with_capacity(LABEL_TABLE.len() + 1);
        for &(label, keywords) in LABEL_TABLE {
            let hits = keywords
                .iter()
                .filter(|kw| contains_phrase(&words, kw))
                .count();
            out.push(EmotionSignal::new(label, confidence_for_hits(hits)));
            if label == "joy" {
                out.push(EmotionSignal::new("neutral", NEUTRAL_BASELINE));
            }
        }
        out
    }
}

/// Lowercased words of `text`. Apostrophes stay inside words so
/// contractions like "can't" survive; typographic apostrophes are folded.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether the words of `phrase` appear consecutively in `words`.
fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

/// Scale by hit count with diminishing returns.
///
/// 0 hits → 0.0, 1 → 0.35, 2 → 0.55, 3 → 0.70, 4+ → +0.05 each, capped at 0.90.
fn confidence_for_hits(hits: usize) -> f32 {
    match hits {
        0 => 0.0,
        1 => 0.35,
        2 => 0.55,
        3 => 0.70,
        _ => (0.70 + 0.05 * (hits as f32 - 3.0)).min(0.90),
    }
}

#[async_trait]
impl TextClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn classify_text(&self, text: &str) -> Result<Vec<EmotionSignal>, ServiceError> {
        Ok(self.distribution(text))
    }
}
