//! Core types for conversation persistence.
//!
//! ```
//! use solace::store::types::{Session, SessionMeta};
//!
//! let meta = SessionMeta::new("session-1a2b3c4d", "u1");
//! assert_eq!(meta.title, "untitled");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionSignal;
use crate::title::UNTITLED_TITLE;

/// Session identifier.
pub type SessionId = String;

/// Current schema version for session files.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One user turn and the assistant reply to it.
///
/// Every field has a default so partially written records still load.
/// `input_text` and `gpt_response` are accepted as legacy field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// What the user said.
    #[serde(default, alias = "input_text")]
    pub user_input: String,
    /// What the assistant replied.
    #[serde(default, alias = "gpt_response")]
    pub assistant_reply: String,
    /// Dominant text emotion for the turn.
    #[serde(default = "EmotionSignal::neutral")]
    pub text_emotion: EmotionSignal,
    /// Dominant tone emotion for the turn.
    #[serde(default = "EmotionSignal::unknown")]
    pub tone_emotion: EmotionSignal,
    /// Creation time, assigned by the store on append.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Create an interaction stamped with the current time.
    pub fn new(
        user_input: impl Into<String>,
        assistant_reply: impl Into<String>,
        text_emotion: EmotionSignal,
        tone_emotion: EmotionSignal,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            assistant_reply: assistant_reply.into(),
            text_emotion,
            tone_emotion,
            created_at: Utc::now(),
        }
    }
}

/// Session bookkeeping: owner, title and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Session identifier, unique per owner.
    pub id: SessionId,
    /// Owner of the session.
    #[serde(default)]
    pub user_id: String,
    /// Current title; the untitled sentinel until a title is synthesized.
    #[serde(default = "default_title")]
    pub title: String,
    /// When the session was created.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// When the last interaction was appended.
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
    /// Schema version for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_title() -> String {
    UNTITLED_TITLE.to_owned()
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl SessionMeta {
    /// Create untitled metadata with both timestamps set to now.
    pub fn new(id: impl Into<SessionId>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            title: default_title(),
            created_at: now,
            last_updated: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }
}

/// A persisted session: metadata plus its interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session metadata.
    pub meta: SessionMeta,
    /// Interactions in append order.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Session {
    /// Create a new empty, untitled session.
    pub fn new(id: impl Into<SessionId>, user_id: impl Into<String>) -> Self {
        Self {
            meta: SessionMeta::new(id, user_id),
            interactions: Vec::new(),
        }
    }

    /// Append `interaction` stamped with `now` and touch `last_updated`.
    pub fn append(&mut self, mut interaction: Interaction, now: DateTime<Utc>) {
        interaction.created_at = now;
        self.interactions.push(interaction);
        self.meta.last_updated = now;
    }

    /// Interactions ordered by creation time, ascending.
    ///
    /// Stable: interactions sharing a timestamp keep append order.
    pub fn ordered_interactions(&self) -> Vec<Interaction> {
        let mut ordered = self.interactions.clone();
        ordered.sort_by_key(|i| i.created_at);
        ordered
    }
}

/// Generate a session ID: `session-` followed by 8 hex characters.
pub fn generate_session_id() -> SessionId {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("session-{}", &uuid[..8])
}

/// Sort session metadata by `last_updated`, most recent first.
pub fn sort_recent_first(sessions: &mut [SessionMeta]) {
    sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
}
