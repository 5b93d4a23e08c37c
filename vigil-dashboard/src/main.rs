//! vigil-dashboard - terminal dashboard for the Vigil push channel
//!
//! Mounts one dashboard view against a hub, logs every state change, and
//! reads simple commands from stdin until Ctrl+C.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use vigil_common::config::ConfigResolver;
use vigil_dashboard::{Alerts, Command, DashboardConfig, DashboardState, DashboardView, TokenStore, ViewDeps};

/// Command-line arguments for vigil-dashboard
#[derive(Parser, Debug)]
#[command(name = "vigil-dashboard")]
#[command(about = "Live notifications and analytics from a Vigil hub")]
#[command(version)]
struct Args {
    /// Hub base URL (e.g. http://127.0.0.1:5780)
    #[arg(short, long)]
    server: Option<String>,

    /// Bearer token for this session; overrides the stored one
    #[arg(long)]
    token: Option<String>,

    /// Store --token for later sessions
    #[arg(long, requires = "token")]
    save_token: bool,

    /// Remove the stored token and exit
    #[arg(long)]
    forget_token: bool,

    /// Fixed delay between reconnect attempts, in milliseconds
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
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

    info!(
        "Starting Vigil dashboard (vigil-dashboard) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let store = TokenStore::default_location();
    if let Some(store) = &store {
        info!("Token storage: {}", store.path().display());
    }

    if args.forget_token {
        let store = store.context("No config directory for token storage")?;
        store.clear().context("Failed to clear stored token")?;
        info!("Stored token removed");
        return Ok(());
    }

    let mut config = DashboardConfig::new(resolver.server_url(args.server.as_deref()));
    config.reconnect_delay = Duration::from_millis(resolver.reconnect_delay_ms(args.reconnect_delay_ms));

    // --token (or VIGIL_API_TOKEN) wins over the stored token for this session
    let deps = match resolver.api_token(args.token.as_deref()) {
        Some(token) => {
            if args.save_token {
                let store = store.as_ref().context("No config directory for token storage")?;
                store.save(&token).context("Failed to save token")?;
                info!("Token saved");
            }
            ViewDeps::with_token(&config, Some(token), Alerts::default())
        }
        None => ViewDeps::connect(&config, store.as_ref(), Alerts::default()),
    }
    .context("Failed to prepare dashboard connection")?;

    let mut view = DashboardView::mount(&config, deps);
    info!("Commands: read <id> | read-all | open | dismiss <id> | clear | retry | list");

    let mut states = view.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut previous = DashboardState::default();
    let mut stdin_open = true;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            changed = states.changed() => {
                if changed.is_err() {
                    warn!("Dashboard view stopped");
                    break;
                }
                let current = states.borrow_and_update().clone();
                log_changes(&previous, &current);
                previous = current;
            }

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if line.trim() == "list" {
                        list_notifications(&previous);
                        continue;
                    }
                    match parse_command(&line) {
                        Some(command) => {
                            if let Err(e) = view.send(command).await {
                                warn!("Command rejected: {}", e);
                            }
                        }
                        None => warn!("Unknown command: {}", line.trim()),
                    }
                }
                // stdin closed; keep following the push channel
                Ok(None) => stdin_open = false,
                Err(e) => warn!("Failed to read stdin: {}", e),
            },
        }
    }

    view.unmount().await;
    info!("Dashboard shutdown complete");
    Ok(())
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let command = match (parts.next()?, parts.next()) {
        ("read", Some(id)) => Command::MarkRead(id.to_string()),
        ("read-all", None) => Command::MarkAllRead,
        ("open", None) => Command::OpenPanel,
        ("dismiss", Some(id)) => Command::Dismiss(id.to_string()),
        ("clear", None) => Command::ClearAll,
        ("retry", None) => Command::Retry,
        _ => return None,
    };
    Some(command)
}

fn log_changes(previous: &DashboardState, current: &DashboardState) {
    if previous.connection.connected != current.connection.connected {
        if current.connection.connected {
            info!("Online");
        } else {
            warn!("Offline");
        }
    }

    if previous.analytics != current.analytics {
        info!("Analytics: {:?}", current.analytics);
    }

    if let Some(snapshot) = &current.snapshot {
        let before = previous.snapshot.as_ref().map(|s| s.total_reports);
        if before != Some(snapshot.total_reports) {
            info!(
                "Reports: {} total, {} today, {} pending, {} urgent",
                snapshot.total_reports,
                snapshot.reports_today,
                snapshot.real_time_metrics.pending_reports,
                snapshot.real_time_metrics.urgent_reports
            );
        }
    }

    for notification in current
        .notifications
        .iter()
        .take_while(|n| previous.notifications.first().map(|p| &p.id) != Some(&n.id))
    {
        info!(
            "[{}] {} - {} ({})",
            notification.priority, notification.title, notification.message, notification.id
        );
    }

    if previous.unread != current.unread {
        info!("Unread: {}", current.unread);
    }
}

fn list_notifications(state: &DashboardState) {
    if state.notifications.is_empty() {
        info!("No notifications");
        return;
    }
    for n in &state.notifications {
        let marker = if n.read { " " } else { "*" };
        info!("{} {} [{}] {}: {}", marker, n.id, n.priority, n.title, n.message);
    }
}

/// Ctrl+C or SIGTERM
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
