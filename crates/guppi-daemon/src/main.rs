//! guppi - a daemon to automate your shell environment.

use anyhow::{Context, Result};
use clap::Parser;
use guppi_core::action::ActionRegistry;
use guppi_core::config::ActionSet;
use guppi_daemon::daemon::{DispatchServer, ServerConfig};
use guppi_daemon::resolver::BuiltinResolver;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A daemon to automate your shell environment.
#[derive(Parser, Debug)]
#[command(name = "guppi")]
#[command(about = "A daemon to automate your shell environment")]
#[command(version)]
struct Args {
    /// The unix domain socket file location on which guppi accepts input
    #[arg(long, value_name = "PATH", default_value = "~/.guppi.socket")]
    socket: String,

    /// The config file in YAML format containing guppi's configuration
    #[arg(long, value_name = "PATH", default_value = "~/.guppi.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_user(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        return tracing::Level::DEBUG;
    }
    match std::env::var("GUPPI_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(args.verbose))
        .with_target(false)
        .init();

    let socket_path = expand_user(&args.socket);
    let config_path = expand_user(&args.config);

    let action_set = ActionSet::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let resolver = BuiltinResolver::with_builtins();
    let registry = Arc::new(
        ActionRegistry::build(action_set, &resolver)
            .context("Failed to build action registry")?,
    );
    info!(
        "Registered {} function action(s), {} shell action(s), prompt {}",
        registry.function_actions().len(),
        registry.shell_actions().len(),
        if registry.prompt().is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let server = DispatchServer::bind(ServerConfig::new(socket_path), registry)
        .context("Failed to bind dispatch socket")?;

    // Graceful shutdown on SIGINT/SIGTERM via cancellation token.
    let cancel = CancellationToken::new();
    let cancel_for_signals = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to create SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received SIGINT (Ctrl+C)");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("Failed to listen for Ctrl+C");
            info!("Received Ctrl+C");
        }

        cancel_for_signals.cancel();
    });

    server.serve(cancel).await?;

    println!("Exit");
    Ok(())
}
