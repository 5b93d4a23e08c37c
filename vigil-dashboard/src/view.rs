//! Dashboard view runtime
//!
//! [`DashboardView::mount`] spawns a single task that owns the connection
//! manager, the notification center and the analytics view model. Inbound
//! events, user commands, the snapshot fetch and the auto-dismiss timer are
//! all handled by that one task, so every mutation happens in order and
//! nothing is shared.
//!
//! After each mutation the task publishes an immutable [`DashboardState`]
//! through a watch channel. Unmounting cancels the task; a fetch still in
//! flight is dropped with it and nothing is published afterwards.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigil_common::events::ChannelEvent;
use vigil_common::AnalyticsSnapshot;

use crate::analytics::{AnalyticsPhase, AnalyticsView, HttpSnapshotSource, SnapshotSource};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::notifications::{Alerts, Notification, NotificationCenter, LOW_PRIORITY_TTL, MAX_NOTIFICATIONS};
use crate::token_store::TokenStore;
use crate::transport::{ChannelConfig, Transport, TransportSignal, WebSocketTransport};
use crate::{Error, Result};

/// Pending user commands per view
const COMMAND_BUFFER: usize = 32;

/// Default fixed reconnect delay
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Hub base URL, `http://` or `https://`
    pub server_url: String,
    pub reconnect_delay: Duration,
    pub low_priority_ttl: Duration,
    /// Maximum notifications held
    pub capacity: usize,
}

impl DashboardConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            low_priority_ttl: LOW_PRIORITY_TTL,
            capacity: MAX_NOTIFICATIONS,
        }
    }

    /// Push-channel endpoint derived from the server URL
    pub fn ws_url(&self) -> Result<String> {
        let base = self.server_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_string()
        } else {
            return Err(Error::InvalidUrl(self.server_url.clone()));
        };
        Ok(format!("{}/ws", ws_base))
    }
}

/// User action, applied in order with inbound events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MarkRead(String),
    MarkAllRead,
    OpenPanel,
    Dismiss(String),
    ClearAll,
    Retry,
}

/// Observable view state
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub connection: ConnectionState,
    /// Newest first
    pub notifications: Vec<Notification>,
    pub unread: usize,
    pub analytics: AnalyticsPhase,
    pub snapshot: Option<AnalyticsSnapshot>,
}

impl DashboardState {
    /// True until the first successful connection, and after every drop
    pub fn is_offline(&self) -> bool {
        self.connection.is_offline()
    }
}

/// Everything a view talks to outside its own task
pub struct ViewDeps {
    pub transport: Box<dyn Transport>,
    pub snapshots: Arc<dyn SnapshotSource>,
    pub alerts: Alerts,
}

impl ViewDeps {
    /// WebSocket and HTTP dependencies for a hub, authenticated with the
    /// stored token when there is one
    ///
    /// An unreadable store is logged and treated as holding no token.
    pub fn connect(
        config: &DashboardConfig,
        tokens: Option<&TokenStore>,
        alerts: Alerts,
    ) -> Result<Self> {
        let token = match tokens.map(TokenStore::load).transpose() {
            Ok(token) => token.flatten(),
            Err(e) => {
                warn!("Could not read stored token, connecting unauthenticated: {}", e);
                None
            }
        };
        Self::with_token(config, token, alerts)
    }

    pub fn with_token(config: &DashboardConfig, token: Option<String>, alerts: Alerts) -> Result<Self> {
        if token.is_none() {
            debug!("No token; push channel will be unauthenticated");
        }

        let transport = WebSocketTransport::new(ChannelConfig {
            url: config.ws_url()?,
            token: token.clone(),
            reconnect_delay: config.reconnect_delay,
        });
        let snapshots = HttpSnapshotSource::new(&config.server_url, token)?;

        Ok(Self {
            transport: Box::new(transport),
            snapshots: Arc::new(snapshots),
            alerts,
        })
    }
}

/// Handle to a mounted dashboard view
pub struct DashboardView {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<DashboardState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DashboardView {
    /// Open the push channel, start the snapshot fetch and spawn the view task
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(config: &DashboardConfig, deps: ViewDeps) -> Self {
        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(DashboardState::default());

        let connection = ConnectionManager::open(deps.transport.as_ref(), &cancel);
        let runtime = ViewRuntime {
            connection,
            notifications: NotificationCenter::with_limits(config.capacity, config.low_priority_ttl),
            analytics: AnalyticsView::new(),
            alerts: deps.alerts,
            snapshots: deps.snapshots,
            state_tx,
        };
        info!("Mounting dashboard view for {}", config.server_url);
        let task = tokio::spawn(runtime.run(command_rx, cancel.clone()));

        Self {
            commands: command_tx,
            state: state_rx,
            cancel,
            task: Some(task),
        }
    }

    /// Latest published state
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Unmounted);
        }
        self.commands.send(command).await.map_err(|_| Error::Unmounted)
    }

    pub async fn mark_read(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::MarkRead(id.into())).await
    }

    pub async fn mark_all_read(&self) -> Result<()> {
        self.send(Command::MarkAllRead).await
    }

    pub async fn open_panel(&self) -> Result<()> {
        self.send(Command::OpenPanel).await
    }

    pub async fn dismiss(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::Dismiss(id.into())).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.send(Command::ClearAll).await
    }

    /// Refetch the snapshot after a failure
    pub async fn retry(&self) -> Result<()> {
        self.send(Command::Retry).await
    }

    /// Close the push channel and stop the view task
    pub async fn unmount(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Dashboard view task ended abnormally: {}", e);
            }
        }
        info!("Dashboard view unmounted");
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ViewRuntime {
    connection: ConnectionManager,
    notifications: NotificationCenter,
    analytics: AnalyticsView,
    alerts: Alerts,
    snapshots: Arc<dyn SnapshotSource>,
    state_tx: watch::Sender<DashboardState>,
}

impl ViewRuntime {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        self.analytics.begin_fetch();
        let mut fetch = self.start_fetch();
        let mut fetching = true;
        let mut commands_open = true;
        self.publish();

        loop {
            let deadline = self.notifications.next_deadline();
            let signals_open = self.connection.is_open();

            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                signal = self.connection.recv(), if signals_open => {
                    if let Some(signal) = signal {
                        self.on_signal(signal);
                    }
                }

                result = &mut fetch, if fetching => {
                    fetching = false;
                    self.analytics.apply_fetch(result);
                }

                command = commands.recv(), if commands_open => match command {
                    Some(Command::Retry) => {
                        if self.analytics.can_retry() && self.analytics.begin_fetch() {
                            info!("Retrying analytics snapshot");
                            fetch = self.start_fetch();
                            fetching = true;
                        } else {
                            debug!("Retry ignored in phase {:?}", self.analytics.phase());
                        }
                    }
                    Some(command) => self.on_command(command),
                    None => commands_open = false,
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let expired = self.notifications.expire_due(Instant::now());
                    debug!("Auto-dismissed {} low-priority notification(s)", expired);
                }
            }

            if cancel.is_cancelled() {
                break;
            }
            self.publish();
        }

        self.connection.close();
        debug!("Dashboard view task stopped");
    }

    fn start_fetch(&self) -> BoxFuture<'static, Result<AnalyticsSnapshot>> {
        let source = Arc::clone(&self.snapshots);
        async move { source.fetch().await }.boxed()
    }

    fn on_signal(&mut self, signal: TransportSignal) {
        let Some(event) = self.connection.apply(signal, Utc::now()) else {
            return;
        };

        debug!("Push event {}", event.name());
        if let ChannelEvent::Unknown { event: name, .. } = &event {
            debug!("Ignoring unknown push event {}", name);
            return;
        }

        if let Some(notification) = self.notifications.push_event(&event, Instant::now()) {
            self.alerts.notify(&notification);
        }
        self.analytics.apply_event(&event);
    }

    fn on_command(&mut self, command: Command) {
        debug!("Command {:?}", command);
        match command {
            Command::MarkRead(id) => {
                self.notifications.mark_read(&id);
            }
            Command::MarkAllRead => self.notifications.mark_all_read(),
            Command::OpenPanel => self.notifications.open_panel(),
            Command::Dismiss(id) => {
                self.notifications.dismiss(&id);
            }
            Command::ClearAll => self.notifications.clear_all(),
            Command::Retry => {}
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(DashboardState {
            connection: self.connection.state().clone(),
            notifications: self.notifications.to_vec(),
            unread: self.notifications.unread_count(),
            analytics: self.analytics.phase().clone(),
            snapshot: self.analytics.snapshot().cloned(),
        });
    }
}
