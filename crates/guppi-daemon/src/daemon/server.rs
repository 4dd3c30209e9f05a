//! The dispatch server: socket lifecycle and the accept loop.
//!
//! The daemon listens on a Unix domain socket (default `~/.guppi.socket`).
//! Clients connect, write one JSON object, optionally read one prompt
//! reply, and the server closes the connection.
//!
//! Two independent concurrency domains bound the server:
//!
//! * the **connection pool** caps concurrently handled connections; a permit
//!   is taken before `accept()`, so excess clients queue in the listen
//!   backlog rather than being refused;
//! * the **execution pool** caps in-flight action executions across all
//!   connections, so a burst of slow actions does not block new connections
//!   and many cheap connections do not starve action throughput.

use crate::daemon::connection;
use anyhow::{Context, Result};
use guppi_core::action::ActionRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Default bound on concurrently handled connections.
pub const DEFAULT_CONNECTION_LIMIT: usize = 100;

/// Default bound on concurrently executing actions across all connections.
pub const DEFAULT_EXECUTION_LIMIT: usize = 500;

/// Server tuning knobs. The two limits are deliberately independent.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    pub connection_limit: usize,
    pub execution_limit: usize,
}

impl ServerConfig {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
            execution_limit: DEFAULT_EXECUTION_LIMIT,
        }
    }
}

/// The bound dispatch server. Owns the listener, the action registry, and
/// both concurrency pools.
pub struct DispatchServer {
    listener: UnixListener,
    socket_path: PathBuf,
    registry: Arc<ActionRegistry>,
    connection_pool: Arc<Semaphore>,
    execution_pool: Arc<Semaphore>,
}

impl DispatchServer {
    /// Bind the Unix domain socket.
    ///
    /// A stale socket file left by a previous run is removed first. There is
    /// no liveness probe before unlinking: a second instance pointed at the
    /// same path silently steals it.
    ///
    /// # Errors
    ///
    /// Bind and stale-file removal failures are fatal; the caller exits
    /// before serving.
    pub fn bind(config: ServerConfig, registry: Arc<ActionRegistry>) -> Result<Self> {
        let socket_path = config.socket_path;

        if let Some(parent) = socket_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if socket_path.exists() {
            warn!("Removing stale socket file: {}", socket_path.display());
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind {}", socket_path.display()))?;
        info!("Listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path,
            registry,
            connection_pool: Arc::new(Semaphore::new(config.connection_limit)),
            execution_pool: Arc::new(Semaphore::new(config.execution_limit)),
        })
    }

    /// Path the server is bound to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept and dispatch connections until the token is cancelled.
    ///
    /// Accept errors are logged and retried after a short pause; nothing a
    /// connection or action does escalates into server-level failure. On
    /// cancellation the server stops promptly without draining in-flight
    /// actions and removes its socket file.
    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        info!("Dispatch accept loop started");

        loop {
            // Accept-time backpressure: hold a connection permit before
            // accepting, so excess clients wait in the listen backlog.
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = self.connection_pool.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.listener.accept() => match result {
                    Ok((stream, _addr)) => {
                        let registry = self.registry.clone();
                        let execution_pool = self.execution_pool.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            connection::handle(stream, registry, execution_pool).await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error on {}: {e}", self.socket_path.display());
                        drop(permit);
                        // Brief pause before retrying to avoid a tight error loop
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        info!("Dispatch accept loop stopped");

        if self.socket_path.exists()
            && let Err(e) = std::fs::remove_file(&self.socket_path)
        {
            warn!("Failed to remove socket file {}: {e}", self.socket_path.display());
        }

        Ok(())
    }
}
