//! vigil-dashboard library - live view over the Vigil push channel
//!
//! A mounted [`DashboardView`] owns exactly one push-channel connection and
//! one task. That task feeds every inbound event, in arrival order, to:
//! - the [`ConnectionManager`] (connected flag, last update time)
//! - the [`NotificationCenter`] (bounded notification list, unread counter,
//!   sound and desktop alerts)
//! - the [`AnalyticsView`] (snapshot fetched once on mount, then patched by
//!   deltas or replaced by full updates)
//!
//! Observers read immutable [`DashboardState`] values from a watch channel.

pub mod analytics;
pub mod connection;
pub mod error;
pub mod notifications;
pub mod token_store;
pub mod transport;
pub mod view;

pub use analytics::{AnalyticsPhase, AnalyticsView, HttpSnapshotSource, SnapshotSource};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{Error, Result};
pub use notifications::{Alerts, Notification, NotificationCenter, NotificationType};
pub use token_store::TokenStore;
pub use transport::{ChannelConfig, Transport, TransportSignal, WebSocketTransport};
pub use view::{Command, DashboardConfig, DashboardState, DashboardView, ViewDeps};
