//! vigil-hub - report intake and real-time event source
//!
//! Serves the report API, the analytics snapshot, and the WebSocket push
//! channel consumed by dashboards.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use vigil_common::config::{ConfigResolver, DataFolderInitializer};
use vigil_hub::{build_router, db, AppState};

/// Command-line arguments for vigil-hub
#[derive(Parser, Debug)]
#[command(name = "vigil-hub")]
#[command(about = "Report intake and push-event hub for Vigil")]
#[command(version)]
struct Args {
    /// Address to listen on (e.g. 127.0.0.1:5780)
    #[arg(short, long)]
    bind: Option<String>,

    /// Folder holding vigil.db
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Staff bearer token; staff routes stay closed without one
    #[arg(long)]
    api_token: Option<String>,

    /// Keep reports in memory only
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = ConfigResolver::new();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| resolver.log_level().into()),
        )
        .init();

    // Build identification first, before any I/O
    info!(
        "Starting Vigil hub (vigil-hub) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let pool = if args.in_memory {
        info!("Using in-memory report store");
        db::connect_in_memory()
            .await
            .context("Failed to open in-memory database")?
    } else {
        let initializer = DataFolderInitializer::new(resolver.data_folder(args.data_folder.as_deref()));
        initializer.ensure_directory_exists()?;
        let db_path = initializer.database_path();
        info!("Database path: {}", db_path.display());
        db::connect(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?
    };

    let api_token = resolver.api_token(args.api_token.as_deref());
    if api_token.is_none() {
        warn!("No staff token configured; staff routes will answer 401");
    }

    let app = build_router(AppState::new(pool, api_token));

    let bind_addr = resolver.bind_addr(args.bind.as_deref());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("vigil-hub listening on http://{}", bind_addr);
    info!("Push channel: ws://{}/ws", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
