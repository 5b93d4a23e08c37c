//! Connection manager: one push channel per mounted view

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vigil_common::events::ChannelEvent;

use crate::transport::{Transport, TransportSignal};

/// Connection status visible to observers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    pub connected: bool,
    /// Time of the most recent inbound event of any type
    pub last_update: Option<DateTime<Utc>>,
}

impl ConnectionState {
    pub fn is_offline(&self) -> bool {
        !self.connected
    }
}

/// Mirrors transport signals into a [`ConnectionState`]
///
/// `connected` changes only on `Connected`/`Disconnected` signals. The
/// channel is closed when the manager is closed or dropped.
pub struct ConnectionManager {
    signals: mpsc::Receiver<TransportSignal>,
    cancel: CancellationToken,
    state: ConnectionState,
    exhausted: bool,
}

impl ConnectionManager {
    /// Open the push channel; it lives until `parent` is cancelled or the
    /// manager is closed
    pub fn open(transport: &dyn Transport, parent: &CancellationToken) -> Self {
        let cancel = parent.child_token();
        let signals = transport.open(cancel.clone());
        Self {
            signals,
            cancel,
            state: ConnectionState::default(),
            exhausted: false,
        }
    }

    /// Next transport signal; `None` once the transport has stopped
    pub async fn recv(&mut self) -> Option<TransportSignal> {
        let signal = self.signals.recv().await;
        if signal.is_none() && !self.exhausted {
            debug!("Push transport stopped");
            self.exhausted = true;
            self.state.connected = false;
        }
        signal
    }

    /// Whether the transport can still deliver signals
    pub fn is_open(&self) -> bool {
        !self.exhausted
    }

    /// Apply one signal; inbound events are handed back to the caller
    pub fn apply(&mut self, signal: TransportSignal, now: DateTime<Utc>) -> Option<ChannelEvent> {
        match signal {
            TransportSignal::Connected => {
                if !self.state.connected {
                    info!("Dashboard online");
                }
                self.state.connected = true;
                None
            }
            TransportSignal::Disconnected { reason } => {
                if self.state.connected {
                    info!("Dashboard offline: {}", reason);
                }
                self.state.connected = false;
                None
            }
            TransportSignal::Event(event) => {
                self.state.last_update = Some(now);
                Some(event)
            }
            TransportSignal::Malformed { error } => {
                debug!("Malformed push frame: {}", error);
                self.state.last_update = Some(now);
                None
            }
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn close(&mut self) {
        self.cancel.cancel();
        self.state.connected = false;
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
