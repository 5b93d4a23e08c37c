//! Sound and desktop-notification side effects
//!
//! Both surfaces are traits so that the terminal binary, tests, and any
//! future front end can plug in their own. Failures are logged and
//! swallowed; an alert never interrupts event processing.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::Notification;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Sound playback failed: {0}")]
    Sound(String),

    #[error("Desktop notification failed: {0}")]
    Desktop(String),
}

/// Desktop notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet
    Default,
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self) -> Result<(), AlertError>;
}

pub trait DesktopNotifier: Send + Sync {
    /// Current permission, without prompting
    fn permission(&self) -> Permission;

    /// Prompt for permission
    fn request_permission(&self) -> Permission;

    fn show(&self, title: &str, body: &str, tag: &str) -> Result<(), AlertError>;
}

/// Rings the terminal bell
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self) -> Result<(), AlertError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| AlertError::Sound(e.to_string()))
    }
}

/// Desktop surface that writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DesktopNotifier for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str, tag: &str) -> Result<(), AlertError> {
        info!(tag = %tag, "{}: {}", title, body);
        Ok(())
    }
}

/// Side effects for newly created notifications
///
/// Permission is resolved once, at construction. A `Default` permission is
/// requested exactly once; the answer is kept for the lifetime of the value
/// and never re-prompted.
#[derive(Clone)]
pub struct Alerts {
    sound: Arc<dyn SoundPlayer>,
    desktop: Arc<dyn DesktopNotifier>,
    permission: Permission,
}

impl Alerts {
    pub fn new(sound: Arc<dyn SoundPlayer>, desktop: Arc<dyn DesktopNotifier>) -> Self {
        let permission = match desktop.permission() {
            Permission::Default => {
                let answer = desktop.request_permission();
                debug!("Desktop notification permission requested: {:?}", answer);
                answer
            }
            known => known,
        };
        Self {
            sound,
            desktop,
            permission,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Run the side effects for one new notification
    pub fn notify(&self, notification: &Notification) {
        if notification.wants_sound() {
            if let Err(e) = self.sound.play() {
                warn!("Alert sound failed for {}: {}", notification.id, e);
            }
        }

        if self.permission == Permission::Granted {
            if let Err(e) =
                self.desktop
                    .show(&notification.title, &notification.message, &notification.id)
            {
                warn!("Desktop notification failed for {}: {}", notification.id, e);
            }
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self::new(Arc::new(TerminalBell), Arc::new(LogNotifier))
    }
}

impl std::fmt::Debug for Alerts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alerts")
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}
