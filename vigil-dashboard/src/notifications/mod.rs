//! Notification aggregator
//!
//! Inbound push events become [`Notification`] records held newest-first by
//! the [`NotificationCenter`]. New records trigger [`Alerts`].

mod alerts;
mod center;
mod model;

pub use alerts::{AlertError, Alerts, DesktopNotifier, LogNotifier, Permission, SoundPlayer, TerminalBell};
pub use center::{NotificationCenter, LOW_PRIORITY_TTL, MAX_NOTIFICATIONS};
pub use model::{Notification, NotificationType};
