//! Conversation persistence.
//!
//! - [`types`]: [`Interaction`], [`Session`], [`SessionMeta`]
//! - [`store`]: the [`ConversationStore`] trait and the in-memory store
//! - [`fs_store`]: JSON files on disk

pub mod fs_store;
#[allow(clippy::module_inception)]
pub mod store;
pub mod types;

pub use fs_store::FsConversationStore;
pub use store::{ConversationStore, MemoryConversationStore};
pub use types::{Interaction, Session, SessionId, SessionMeta};
