//! Error types for the solace pipeline.
//!
//! Two layers:
//! - [`ServiceError`]: a failure reported by one external collaborator
//!   (classifier, generator, store). Each variant carries a stable code.
//!   These never escape `process_turn`; the owning stage degrades instead.
//! - [`SolaceError`]: the crate-level error visible to callers: malformed
//!   input, bad configuration, I/O at the service boundary.

/// Stable error codes for programmatic error handling.
///
/// These codes never change and form part of the public API contract.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Authentication failed (invalid/missing API key).
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// Request to the remote service failed.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// Request or operation timed out.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Provider-specific error not covered by other variants.
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";

    /// The service answered with a body we could not interpret.
    pub const RESPONSE_INVALID: &str = "RESPONSE_INVALID";

    /// Session or interaction persistence error.
    pub const STORE_ERROR: &str = "STORE_ERROR";
}

/// Errors produced by external collaborators.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// Authentication failed (invalid/missing API key).
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    AuthError(String),

    /// Request to the remote service failed.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    RequestError(String),

    /// Request or operation timed out.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    TimeoutError(String),

    /// Provider-specific error not covered by other variants.
    #[error("[{}] {}", error_codes::PROVIDER_ERROR, .0)]
    ProviderError(String),

    /// Unparseable or empty response body.
    #[error("[{}] {}", error_codes::RESPONSE_INVALID, .0)]
    ResponseError(String),

    /// Session or interaction persistence error.
    #[error("[{}] {}", error_codes::STORE_ERROR, .0)]
    StoreError(String),
}

impl ServiceError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::AuthError(_) => error_codes::AUTH_FAILED,
            Self::RequestError(_) => error_codes::REQUEST_FAILED,
            Self::TimeoutError(_) => error_codes::TIMEOUT_ERROR,
            Self::ProviderError(_) => error_codes::PROVIDER_ERROR,
            Self::ResponseError(_) => error_codes::RESPONSE_INVALID,
            Self::StoreError(_) => error_codes::STORE_ERROR,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::AuthError(m)
            | Self::RequestError(m)
            | Self::TimeoutError(m)
            | Self::ProviderError(m)
            | Self::ResponseError(m)
            | Self::StoreError(m) => m,
        }
    }

    /// Returns true if this error represents a transient failure.
    ///
    /// Network errors, timeouts, rate limits and 5xx responses are transient.
    /// Auth, config, malformed responses and store errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestError(_) | Self::TimeoutError(_) | Self::ProviderError(_) => true,
            Self::ConfigError(_)
            | Self::AuthError(_)
            | Self::ResponseError(_)
            | Self::StoreError(_) => false,
        }
    }
}

/// Top-level error type for the solace crate.
#[derive(Debug, thiserror::Error)]
pub enum SolaceError {
    /// Caller supplied a malformed turn (missing ids, empty text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Collaborator error surfaced at the service boundary (never from `process_turn`).
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SolaceError>;
