//! Types passed into and out of the turn pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::emotion::{AudioHandle, EmotionSignal};
use crate::error::{Result, SolaceError};

/// One user turn as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Owner of the session.
    pub user_id: String,
    /// Target session.
    pub session_id: String,
    /// What the user said.
    pub text: String,
    /// Optional recording of the user's voice for tone classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
}

impl TurnRequest {
    /// A text-only turn.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            text: text.into(),
            audio_path: None,
        }
    }

    /// Attach an audio file.
    pub fn with_audio_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(path.into());
        self
    }

    /// The audio handle for this turn, if any.
    pub fn audio(&self) -> Option<AudioHandle> {
        self.audio_path.clone().map(AudioHandle::File)
    }

    /// Reject blank identifiers and text before any stage runs.
    ///
    /// # Errors
    ///
    /// Returns [`SolaceError::InvalidInput`] naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        validate_turn_input(&self.user_id, &self.session_id, &self.text)
    }
}

/// Shared input check for [`TurnRequest`] and `process_turn`.
pub(crate) fn validate_turn_input(user_id: &str, session_id: &str, text: &str) -> Result<()> {
    for (field, value) in [
        ("user_id", user_id),
        ("session_id", session_id),
        ("text", text),
    ] {
        if value.trim().is_empty() {
            return Err(SolaceError::InvalidInput(format!("{field} must not be empty")));
        }
    }
    Ok(())
}

/// Structured result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The reply shown to the user.
    pub reply: String,
    /// Dominant text emotion.
    pub text_emotion: EmotionSignal,
    /// Dominant tone emotion (`Unknown` without audio).
    pub tone_emotion: EmotionSignal,
    /// Session title, or `None` while the session is untitled.
    pub title: Option<String>,
    /// Temperature derived from the text emotion.
    pub temperature: f64,
    /// Whether the crisis bypass replaced generation.
    pub crisis: bool,
    /// Whether `reply` is the generation fallback.
    pub degraded: bool,
}
