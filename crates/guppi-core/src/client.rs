//! Client helper for delivering events to a running daemon.
//!
//! The protocol is one JSON object per connection:
//!
//! 1. Client connects to the Unix domain socket
//! 2. Client writes one JSON object and half-closes its write side
//! 3. Server optionally writes a prompt reply (UTF-8 text), then closes
//!
//! No reply bytes are sent unless a prompt action is configured, enabled,
//! and succeeds.

use crate::event::Event;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Deliver one event and return the prompt reply, if any.
///
/// # Errors
///
/// Returns an error when the daemon is unreachable or the socket I/O fails.
pub async fn send_event(socket_path: &Path, event: &Event) -> Result<Option<String>> {
    let payload = serde_json::to_vec(event).context("Failed to serialize event")?;
    send_raw(socket_path, &payload).await
}

/// Deliver a raw payload. Exposed so triggers can forward pre-encoded JSON
/// without decoding it first.
///
/// # Errors
///
/// Returns an error when the daemon is unreachable or the socket I/O fails.
pub async fn send_raw(socket_path: &Path, payload: &[u8]) -> Result<Option<String>> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("Failed to connect to {}", socket_path.display()))?;

    stream
        .write_all(payload)
        .await
        .context("Failed to write event payload")?;
    // Half-close so the server's single bounded read returns promptly.
    stream
        .shutdown()
        .await
        .context("Failed to shut down write side")?;

    let mut reply = Vec::new();
    stream
        .read_to_end(&mut reply)
        .await
        .context("Failed to read prompt reply")?;

    if reply.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&reply).into_owned()))
    }
}
