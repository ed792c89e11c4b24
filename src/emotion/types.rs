//! Emotion signal types shared by the classifiers, collector and fusion.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Label used when the text classifier fails or returns nothing.
pub const NEUTRAL_LABEL: &str = "Neutral";

/// Label used when no audio is present or the audio classifier fails.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One classifier output: a label with a confidence score in `0.0..=1.0`.
///
/// Classifiers return an ordered list of these (a distribution); the
/// collector reduces each list to the single dominant entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSignal {
    /// Emotion label as reported by the classifier (e.g. `"joy"`).
    #[serde(default)]
    pub label: String,
    /// Confidence score.
    #[serde(default)]
    pub score: f32,
}

impl EmotionSignal {
    /// Create a signal, clamping the score into `0.0..=1.0`.
    ///
    /// Non-finite scores become `0.0`.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            label: label.into(),
            score,
        }
    }

    /// Text fallback: `{label: "Neutral", score: 0.0}`.
    pub fn neutral() -> Self {
        Self::new(NEUTRAL_LABEL, 0.0)
    }

    /// Audio fallback: `{label: "Unknown", score: 0.0}`.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LABEL, 0.0)
    }

    /// Case-insensitive label comparison.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label)
    }
}

/// Reduce a distribution to its dominant entry.
///
/// Picks the entry with the maximum score. Ties keep the first-seen entry,
/// so the result is stable on classifier output order. Entries with a
/// non-finite score are ignored. Returns `None` for an empty (or all
/// non-finite) distribution.
pub fn dominant(distribution: &[EmotionSignal]) -> Option<EmotionSignal> {
    let mut best: Option<&EmotionSignal> = None;
    for entry in distribution.iter().filter(|e| e.score.is_finite()) {
        match best {
            Some(current) if entry.score <= current.score => {}
            _ => best = Some(entry),
        }
    }
    best.map(|e| EmotionSignal::new(e.label.clone(), e.score))
}

/// A reference to the user's recorded audio for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioHandle {
    /// Audio stored in a file on disk.
    File(PathBuf),
    /// Audio already held in memory.
    Bytes {
        /// Encoded audio payload.
        data: Bytes,
        /// MIME type of the payload (e.g. `"audio/wav"`).
        content_type: String,
    },
}

impl AudioHandle {
    /// Reference an audio file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Wrap an in-memory payload.
    pub fn bytes(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Load the payload and its MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::RequestError`] if the file cannot be read.
    pub async fn load(&self) -> Result<(Bytes, String), ServiceError> {
        match self {
            Self::File(path) => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    ServiceError::RequestError(format!(
                        "failed to read audio file {}: {e}",
                        path.display()
                    ))
                })?;
                Ok((Bytes::from(data), content_type_for(path).to_owned()))
            }
            Self::Bytes { data, content_type } => Ok((data.clone(), content_type.clone())),
        }
    }
}

/// Guess an audio MIME type from a file extension.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a") | Some("mp4") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
