//! Stdin/stdout JSON bridge for the host command channel.
//!
//! Reads newline-delimited JSON [`CommandEnvelope`] messages, dispatches
//! each through the [`HostHandler`], and writes one [`ResponseEnvelope`]
//! line per command. A malformed line (bad JSON or invalid UTF-8) gets an
//! error response; the bridge keeps reading until EOF.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Result, SolaceError};
use crate::host::contract::{CommandEnvelope, ResponseEnvelope};
use crate::host::handler::HostHandler;

/// Run the bridge over the process's stdin and stdout until stdin closes.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or stdout cannot be written.
pub async fn run_stdio_bridge(handler: &HostHandler) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    run_bridge(handler, reader, writer).await
}

/// Run the bridge over arbitrary line reader and writer.
///
/// Commands are handled one at a time in arrival order.
///
/// # Errors
///
/// Returns an error on read or write failure.
pub async fn run_bridge<R, W>(handler: &HostHandler, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let bytes_read = reader.read_until(b'\n', &mut buf).await?;
        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down bridge");
            break;
        }

        let trimmed = buf.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_slice::<CommandEnvelope>(trimmed) {
            Ok(envelope) => handler.handle(envelope).await,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    line_len = trimmed.len(),
                    "failed to parse command envelope"
                );
                ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                )
            }
        };

        let json = serde_json::to_string(&response).map_err(|e| SolaceError::Io(e.into()))?;
        write_line(&mut writer, &json).await?;
    }
    Ok(())
}

/// Write a single JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
