//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin,
//! runs them against the turn pipeline, and writes one `ResponseEnvelope`
//! per command to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use solace::SolaceConfig;
use solace::host::{HostHandler, run_stdio_bridge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    solace::observability::init_tracing();

    let config_path = std::env::var_os("SOLACE_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(SolaceConfig::default_config_path);
    let mut config = SolaceConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?;
    config.apply_env_overrides();

    tracing::info!(config = %config_path.display(), "solace-host starting");

    let handler = HostHandler::from_config(&config)
        .map_err(|e| anyhow::anyhow!("solace-host setup failed: {e}"))?;

    run_stdio_bridge(&handler).await.map_err(|e| {
        tracing::error!(error = %e, "solace-host exited with error");
        anyhow::anyhow!("solace-host failed: {e}")
    })?;

    tracing::info!("solace-host shut down cleanly");
    Ok(())
}
