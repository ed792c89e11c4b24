//! Application directory paths for Solace.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! # Environment Overrides
//!
//! - `SOLACE_DATA_DIR`: overrides [`data_dir`]
//! - `SOLACE_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Resolves to `dirs::data_dir()/solace/` by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SOLACE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("solace"))
        .unwrap_or_else(|| PathBuf::from("/tmp/solace-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/solace/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SOLACE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("solace"))
        .unwrap_or_else(|| PathBuf::from("/tmp/solace-config"))
}

/// Session store directory (`data_dir()/sessions/`).
#[must_use]
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}
