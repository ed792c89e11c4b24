//! Response generation stage.
//!
//! Wraps a [`ReplyGenerator`] with a time bound, output cleaning and the
//! failure fallback. A failed or timed-out call never escapes this stage;
//! it becomes a deterministic fallback reply carrying the error detail.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::provider::ReplyGenerator;
use crate::context::AdaptivePromptContext;
use crate::error::ServiceError;
use crate::observability::SPAN_GENERATE;

/// Result of the generation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    /// The cleaned reply, or the fallback text.
    pub text: String,
    /// `true` when `text` is the fallback rather than model output.
    pub degraded: bool,
}

/// Runs the reply model for one turn.
pub struct ResponseGenerator {
    generator: Arc<dyn ReplyGenerator>,
    timeout: Duration,
}

impl ResponseGenerator {
    /// Wrap `generator`, bounding each call by `timeout`.
    pub fn new(generator: Arc<dyn ReplyGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generate a cleaned reply for `context`.
    pub async fn generate(&self, context: &AdaptivePromptContext) -> GeneratedReply {
        let span = tracing::info_span!(
            SPAN_GENERATE,
            generator = self.generator.name(),
            temperature = context.temperature,
            messages = context.history.len(),
        );
        match self.call(context).instrument(span).await {
            Ok(text) => GeneratedReply {
                text,
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "reply generation failed, using fallback"
                );
                GeneratedReply {
                    text: fallback_reply(&e),
                    degraded: true,
                }
            }
        }
    }

    async fn call(&self, context: &AdaptivePromptContext) -> Result<String, ServiceError> {
        let raw = tokio::time::timeout(
            self.timeout,
            self.generator.generate_reply(
                &context.system_instruction,
                &context.history,
                context.temperature,
            ),
        )
        .await
        .map_err(|_| {
            ServiceError::TimeoutError(format!(
                "reply generation timed out after {} ms",
                self.timeout.as_millis()
            ))
        })??;

        let cleaned = clean_reply(&raw);
        if cleaned.is_empty() {
            return Err(ServiceError::ResponseError("model returned an empty reply".into()));
        }
        tracing::debug!(raw_len = raw.len(), reply_len = cleaned.len(), "reply generated");
        Ok(cleaned)
    }
}

/// Deterministic reply used when generation fails.
pub fn fallback_reply(error: &ServiceError) -> String {
    format!("Sorry, I ran into a problem generating a reply. ({error})")
}

/// Normalize model output.
///
/// Collapses every run of three or more `\n` to exactly two, then trims
/// surrounding whitespace. Idempotent.
pub fn clean_reply(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            continue;
        }
        push_newlines(&mut out, newlines);
        newlines = 0;
        out.push(ch);
    }
    push_newlines(&mut out, newlines);
    out.trim().to_owned()
}

fn push_newlines(out: &mut String, run: usize) {
    for _ in 0..run.min(2) {
        out.push('\n');
    }
}
