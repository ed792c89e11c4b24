//! Structured tracing spans and subscriber setup.
//!
//! Spans follow the hierarchy:
//!
//! ```text
//! solace.turn
//!   ├─> solace.classify   (one per modality)
//!   ├─> solace.generate
//!   ├─> solace.store      (history read, interaction append)
//!   └─> solace.title
//! ```
//!
//! User text and model replies are never recorded on spans; only ids,
//! labels, scores and lengths.

// Span names (hierarchical, dot-separated)
/// Root span for one `process_turn` call.
pub const SPAN_TURN: &str = "solace.turn";

/// Span for a single classifier call.
pub const SPAN_CLASSIFY: &str = "solace.classify";

/// Span for the reply generation call.
pub const SPAN_GENERATE: &str = "solace.generate";

/// Span for a session store operation.
pub const SPAN_STORE: &str = "solace.store";

/// Span for the title check and synthesis.
pub const SPAN_TITLE: &str = "solace.title";

// Field keys for span attributes
/// Session identifier field.
pub const FIELD_SESSION_ID: &str = "session_id";

/// Owner identifier field.
pub const FIELD_USER_ID: &str = "user_id";

/// Signal modality field (`"text"` or `"audio"`).
pub const FIELD_MODALITY: &str = "modality";

/// Store operation field (e.g. `"append"`, `"history"`).
pub const FIELD_OPERATION: &str = "operation";

/// Install the global `fmt` subscriber writing to stderr.
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
