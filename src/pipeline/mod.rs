//! The turn pipeline: request/outcome types and the orchestrator.

pub mod messages;
pub mod orchestrator;

pub use messages::{TurnOutcome, TurnRequest};
pub use orchestrator::{Collaborators, TurnOrchestrator};
