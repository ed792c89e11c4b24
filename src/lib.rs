//! Solace: emotion-aware turn pipeline for a conversational wellness assistant.
//!
//! Each user turn flows through a fixed sequence of stages:
//! Signals → Fusion → Crisis check → Context → Generation → Persist → Title
//!
//! # Architecture
//!
//! Every external dependency is an injected collaborator behind a trait:
//! - **Classifiers**: text and (optional) audio emotion models
//! - **Generators**: the reply model and the lightweight title model
//! - **Store**: session and interaction persistence
//!
//! The [`TurnOrchestrator`] owns no global state. A failure in any single
//! collaborator degrades its own stage to a fixed fallback; only malformed
//! input surfaces to the caller as an error.

pub mod config;
pub mod context;
pub mod crisis;
pub mod emotion;
pub mod error;
pub mod host;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod solace_dirs;
pub mod store;
pub mod title;

pub use config::SolaceConfig;
pub use emotion::{AudioHandle, EmotionSignal};
pub use error::{Result, ServiceError, SolaceError};
pub use pipeline::messages::{TurnOutcome, TurnRequest};
pub use pipeline::orchestrator::{Collaborators, TurnOrchestrator};
