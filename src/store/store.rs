//! Conversation store trait and in-memory implementation.
//!
//! ```
//! use solace::store::store::MemoryConversationStore;
//!
//! let store = MemoryConversationStore::new();
//! let store2 = store.clone();
//! assert!(format!("{store2:?}").contains("MemoryConversationStore"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::types::{
    Interaction, Session, SessionId, SessionMeta, generate_session_id, sort_recent_first,
};
use crate::error::ServiceError;

/// Async conversation storage backend.
///
/// Sessions are scoped by owner: every call names both `user_id` and
/// `session_id`. The store is the only arbiter of interaction order; it
/// stamps `created_at` on append.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new empty, untitled session and return its ID.
    async fn create_session(&self, user_id: &str) -> Result<SessionId, ServiceError>;

    /// Load session metadata.
    ///
    /// Returns [`ServiceError::StoreError`] if the session does not exist.
    async fn get_session(&self, user_id: &str, session_id: &str)
    -> Result<SessionMeta, ServiceError>;

    /// List the owner's sessions, most recently updated first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionMeta>, ServiceError>;

    /// Append an interaction, stamping `created_at` and touching `last_updated`.
    ///
    /// Creates the session if it does not exist yet.
    async fn append_interaction(
        &self,
        user_id: &str,
        session_id: &str,
        interaction: Interaction,
    ) -> Result<(), ServiceError>;

    /// Interactions ordered by creation time, ascending.
    ///
    /// An unknown session has no interactions.
    async fn get_interactions(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Interaction>, ServiceError>;

    /// Current session title.
    async fn get_title(&self, user_id: &str, session_id: &str) -> Result<String, ServiceError>;

    /// Overwrite the session title.
    async fn set_title(
        &self,
        user_id: &str,
        session_id: &str,
        title: &str,
    ) -> Result<(), ServiceError>;
}

pub(crate) fn not_found(user_id: &str, session_id: &str) -> ServiceError {
    ServiceError::StoreError(format!("session not found: {user_id}/{session_id}"))
}

type SessionKey = (String, SessionId);

fn key(user_id: &str, session_id: &str) -> SessionKey {
    (user_id.to_owned(), session_id.to_owned())
}

/// In-memory conversation store for tests and ephemeral usage.
///
/// Sessions live in an `Arc<RwLock<HashMap>>` and are lost when the last
/// clone is dropped. Thread-safe and cheaply cloneable.
#[derive(Debug, Clone, Default)]
pub struct MemoryConversationStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Session>>>,
}

impl MemoryConversationStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a whole session.
    pub async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(key(&session.meta.user_id, &session.meta.id), session);
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionId, ServiceError> {
        let mut sessions = self.sessions.write().await;
        let mut id = generate_session_id();
        while sessions.contains_key(&key(user_id, &id)) {
            id = generate_session_id();
        }
        sessions.insert(key(user_id, &id), Session::new(id.clone(), user_id));
        Ok(id)
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionMeta, ServiceError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&key(user_id, session_id))
            .map(|s| s.meta.clone())
            .ok_or_else(|| not_found(user_id, session_id))
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionMeta>, ServiceError> {
        let sessions = self.sessions.read().await;
        let mut metas: Vec<SessionMeta> = sessions
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, s)| s.meta.clone())
            .collect();
        sort_recent_first(&mut metas);
        Ok(metas)
    }

    async fn append_interaction(
        &self,
        user_id: &str,
        session_id: &str,
        interaction: Interaction,
    ) -> Result<(), ServiceError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key(user_id, session_id))
            .or_insert_with(|| Session::new(session_id, user_id))
            .append(interaction, Utc::now());
        Ok(())
    }

    async fn get_interactions(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Interaction>, ServiceError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(&key(user_id, session_id))
            .map(Session::ordered_interactions)
            .unwrap_or_default())
    }

    async fn get_title(&self, user_id: &str, session_id: &str) -> Result<String, ServiceError> {
        self.get_session(user_id, session_id)
            .await
            .map(|meta| meta.title)
    }

    async fn set_title(
        &self,
        user_id: &str,
        session_id: &str,
        title: &str,
    ) -> Result<(), ServiceError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&key(user_id, session_id))
            .ok_or_else(|| not_found(user_id, session_id))?;
        session.meta.title = title.to_owned();
        Ok(())
    }
}
