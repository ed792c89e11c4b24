//! Model collaborator traits.
//!
//! [`ReplyGenerator`] is the main language-model call; [`LabelGenerator`]
//! is the lightweight call used to name sessions. The concrete adapters in
//! [`openai`](super::openai) and [`gemini`](super::gemini) implement both.

use async_trait::async_trait;

use super::message::Message;
use crate::error::ServiceError;

/// Produces the assistant reply for a turn.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Short backend name for logs (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Generate a reply.
    ///
    /// `instructions` is the system instruction. `history` holds the prior
    /// turns in order followed by the live user message, and never contains
    /// a system message.
    async fn generate_reply(
        &self,
        instructions: &str,
        history: &[Message],
        temperature: f64,
    ) -> Result<String, ServiceError>;
}

/// Produces a short label (a session title) from a single prompt.
#[async_trait]
pub trait LabelGenerator: Send + Sync {
    /// Generate a raw label. Callers clean and validate the output.
    async fn generate_short_label(&self, prompt: &str) -> Result<String, ServiceError>;
}
