//! Filesystem-backed conversation store.
//!
//! Each session is stored as `{data_dir}/{user_id}/{session_id}.json`.
//! Writes are atomic (unique temp file + fsync + rename) to prevent
//! corruption on crash. Read-modify-write updates to one session are
//! serialized by a per-session lock, so concurrent appends are all kept.
//!
//! ```no_run
//! use solace::store::fs_store::FsConversationStore;
//!
//! let store = FsConversationStore::new("/tmp/solace-sessions").unwrap();
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::store::{ConversationStore, not_found};
use super::types::{
    Interaction, Session, SessionId, SessionMeta, generate_session_id, sort_recent_first,
};
use crate::error::ServiceError;

/// Filesystem-backed conversation store.
#[derive(Debug, Clone)]
pub struct FsConversationStore {
    data_dir: PathBuf,
    locks: Arc<Mutex<HashMap<(String, String), Arc<Mutex<()>>>>>,
}

/// Reject ids that could escape the data directory.
fn validate_id(kind: &str, id: &str) -> Result<(), ServiceError> {
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::StoreError(format!(
            "invalid {kind} \"{id}\" (use alphanumeric, - or _)"
        )));
    }
    Ok(())
}

impl FsConversationStore {
    /// Create a new filesystem store, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::StoreError`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to create session directory {}: {e}",
                data_dir.display()
            ))
        })?;
        Ok(Self {
            data_dir,
            locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf, ServiceError> {
        validate_id("user id", user_id)?;
        Ok(self.data_dir.join(user_id))
    }

    fn session_path(&self, user_id: &str, session_id: &str) -> Result<PathBuf, ServiceError> {
        validate_id("session id", session_id)?;
        Ok(self.user_dir(user_id)?.join(format!("{session_id}.json")))
    }

    /// The write lock for one session, created on first use.
    async fn session_lock(&self, user_id: &str, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry((user_id.to_owned(), session_id.to_owned()))
                .or_default(),
        )
    }

    fn read_session_file(path: &Path) -> Result<Session, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to read session file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to parse session file {}: {e}",
                path.display()
            ))
        })
    }

    /// Load a session, or `None` if its file does not exist.
    fn load(&self, user_id: &str, session_id: &str) -> Result<Option<Session>, ServiceError> {
        let path = self.session_path(user_id, session_id)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read_session_file(&path).map(Some)
    }

    fn load_existing(&self, user_id: &str, session_id: &str) -> Result<Session, ServiceError> {
        self.load(user_id, session_id)?
            .ok_or_else(|| not_found(user_id, session_id))
    }

    /// Atomically write a session to disk.
    fn write_session_atomic(&self, session: &Session) -> Result<(), ServiceError> {
        let dir = self.user_dir(&session.meta.user_id)?;
        let path = self.session_path(&session.meta.user_id, &session.meta.id)?;
        std::fs::create_dir_all(&dir).map_err(|e| {
            ServiceError::StoreError(format!("failed to create {}: {e}", dir.display()))
        })?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ServiceError::StoreError(format!("failed to serialize session: {e}")))?;

        // Unique temp file in the same directory so the rename stays atomic.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to create temp file in {}: {e}",
                dir.display()
            ))
        })?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| {
                ServiceError::StoreError(format!(
                    "failed to write temp file {}: {e}",
                    tmp.path().display()
                ))
            })?;

        tmp.persist(&path).map(|_| ()).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to rename temp file to {}: {}",
                path.display(),
                e.error
            ))
        })
    }
}

#[async_trait]
impl ConversationStore for FsConversationStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionId, ServiceError> {
        let mut id = generate_session_id();
        while self.session_path(user_id, &id)?.exists() {
            id = generate_session_id();
        }
        self.write_session_atomic(&Session::new(id.clone(), user_id))?;
        Ok(id)
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionMeta, ServiceError> {
        self.load_existing(user_id, session_id).map(|s| s.meta)
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionMeta>, ServiceError> {
        let dir = self.user_dir(user_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            ServiceError::StoreError(format!(
                "failed to read session directory {}: {e}",
                dir.display()
            ))
        })?;

        let mut metas = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_session_file(&path) {
                Ok(session) => metas.push(session.meta),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable session file"),
            }
        }
        sort_recent_first(&mut metas);
        Ok(metas)
    }

    async fn append_interaction(
        &self,
        user_id: &str,
        session_id: &str,
        interaction: Interaction,
    ) -> Result<(), ServiceError> {
        let lock = self.session_lock(user_id, session_id).await;
        let _guard = lock.lock().await;
        let mut session = self
            .load(user_id, session_id)?
            .unwrap_or_else(|| Session::new(session_id, user_id));
        session.append(interaction, Utc::now());
        self.write_session_atomic(&session)
    }

    async fn get_interactions(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Interaction>, ServiceError> {
        Ok(self
            .load(user_id, session_id)?
            .map(|s| s.ordered_interactions())
            .unwrap_or_default())
    }

    async fn get_title(&self, user_id: &str, session_id: &str) -> Result<String, ServiceError> {
        self.load_existing(user_id, session_id).map(|s| s.meta.title)
    }

    async fn set_title(
        &self,
        user_id: &str,
        session_id: &str,
        title: &str,
    ) -> Result<(), ServiceError> {
        let lock = self.session_lock(user_id, session_id).await;
        let _guard = lock.lock().await;
        let mut session = self.load_existing(user_id, session_id)?;
        session.meta.title = title.to_owned();
        self.write_session_atomic(&session)
    }
}
