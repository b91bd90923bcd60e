//! zdag server binary.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! zdag --config zdag.yaml
//!
//! # With environment variables only
//! ZDAG_SERVER__PORT=9000 ZDAG_ENGINE__DENY_CYCLES=true zdag
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use zdag_api::http::{create_app, AppState};
use zdag_api::observability::{init_logging, LoggingConfig};
use zdag_server::ServerConfig;
use zdag_storage::{EdgeStore, MemoryEdgeStore};

/// zdag - relation graph service for relationship-based access control
#[derive(Parser, Debug)]
#[command(name = "zdag")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ServerConfig::resolve(args.config.as_deref())?;

    init_logging(&LoggingConfig::from_settings(&config.logging));
    info!(version = env!("CARGO_PKG_VERSION"), "starting zdag");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    match config.storage.backend.as_str() {
        "memory" => {
            info!("using in-memory storage backend");
            serve(MemoryEdgeStore::new_shared(), addr, &config).await
        }
        other => {
            // validate() already rejects these; kept for exhaustiveness.
            error!(backend = other, "unknown storage backend");
            anyhow::bail!("unknown storage backend: {other}");
        }
    }
}

async fn serve<S: EdgeStore>(
    storage: Arc<S>,
    addr: SocketAddr,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let state = AppState::with_engine_settings(storage, &config.engine);
    let app = create_app(state, &config.server);

    info!(
        %addr,
        deny_cycles = config.engine.deny_cycles,
        query_timeout_ms = config.engine.query_timeout_ms,
        "HTTP server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}
