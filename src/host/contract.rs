//! Versioned command/response envelopes for the host bridge.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Contract version for host envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Commands understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    /// Create an empty, untitled session.
    NewSession,
    /// Run one conversational turn.
    Turn,
    /// List a user's sessions, most recent first.
    ListSessions,
    /// Return a session's interactions, oldest first.
    History,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewSession => "new_session",
            Self::Turn => "turn",
            Self::ListSessions => "list_sessions",
            Self::History => "history",
        }
    }
}

/// A command read from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Caller-chosen correlation ID, echoed in the response.
    #[serde(default)]
    pub request_id: String,
    /// The command to run.
    pub op: CommandName,
    /// Command arguments.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build an envelope.
    pub fn new(request_id: impl Into<String>, op: CommandName, payload: serde_json::Value) -> Self {
        Self {
            request_id: request_id.into(),
            op,
            payload,
        }
    }
}

/// The bridge's answer to one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Contract version.
    pub v: u32,
    /// Echo of the command's `request_id`.
    pub request_id: String,
    /// Whether the command succeeded.
    pub ok: bool,
    /// Result data on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Error text on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Successful response.
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// Failed response.
    pub fn error(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }
}

/// `new_session` / `list_sessions` arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    /// Owner of the sessions.
    pub user_id: String,
}

/// `history` arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    /// Owner of the session.
    pub user_id: String,
    /// Session to read.
    pub session_id: String,
}

/// `turn` arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnPayload {
    /// Owner of the session.
    pub user_id: String,
    /// Target session.
    pub session_id: String,
    /// What the user said.
    pub text: String,
    /// Optional path to a voice recording for tone classification.
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
}
