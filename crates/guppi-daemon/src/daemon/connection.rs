//! Per-connection protocol handling.
//!
//! Each accepted connection runs a terminal state machine: one bounded
//! read, decode, optional synchronous prompt reply, fan-out, close. The
//! client only ever receives the prompt's reply; fan-out action outcomes
//! are logged, never aggregated back.

use guppi_core::action::ActionRegistry;
use guppi_core::event::{Env, Event, MAX_REQUEST_BYTES};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Handle one accepted client connection.
///
/// Every path is terminal: the stream closes when this returns, regardless
/// of fan-out completion. Transport and decode failures abort only this
/// connection.
pub async fn handle(
    mut stream: UnixStream,
    registry: Arc<ActionRegistry>,
    execution_pool: Arc<Semaphore>,
) {
    // Single bounded read; larger payloads are truncated, not reassembled.
    let mut buf = vec![0u8; MAX_REQUEST_BYTES];
    let n = match stream.read(&mut buf).await {
        Ok(0) => {
            debug!("Client disconnected without sending an event");
            return;
        }
        Ok(n) => n,
        Err(e) => {
            warn!("Failed to read event payload: {e}");
            return;
        }
    };

    let event = match Event::decode(&buf[..n]) {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to parse incoming payload. Reason: {e}");
            return;
        }
    };

    let env = Env::new();

    // The prompt reply, if any, goes back before fan-out is scheduled. A
    // failing prompt has already been logged and sends nothing.
    if let Some(reply) = registry.run_prompt(&event, &env) {
        if let Err(e) = stream.write_all(reply.as_bytes()).await {
            warn!("Failed to write prompt reply: {e}");
        }
    }

    fan_out(&registry, &event, &env, &execution_pool);
}

/// Schedule every enabled action against the event, fire-and-forget.
///
/// Enqueueing never blocks: each task waits for an execution-pool permit
/// inside its own spawn. Fan-out order and completion order are
/// unspecified.
fn fan_out(
    registry: &Arc<ActionRegistry>,
    event: &Event,
    env: &Env,
    execution_pool: &Arc<Semaphore>,
) {
    for action in registry.function_actions() {
        let action = action.clone();
        let event = event.clone();
        let env = env.clone();
        let pool = execution_pool.clone();
        tokio::spawn(async move {
            let Ok(_permit) = pool.acquire_owned().await else {
                return;
            };
            action.execute(&event, &env);
        });
    }

    for action in registry.shell_actions() {
        let action = action.clone();
        let registry = Arc::clone(registry);
        let event = event.clone();
        let env = env.clone();
        let pool = execution_pool.clone();
        tokio::spawn(async move {
            let Ok(_permit) = pool.acquire_owned().await else {
                return;
            };
            action.execute(&event, &env, registry.locks()).await;
        });
    }
}
