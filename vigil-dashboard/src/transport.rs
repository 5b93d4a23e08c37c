//! Push-channel transport
//!
//! The transport owns the socket and the reconnection policy. It reports
//! what happens on the wire as [`TransportSignal`]s over an mpsc channel;
//! the connection manager only mirrors those signals.
//!
//! Reconnection uses a fixed delay and retries until cancelled. A failed
//! connection attempt sends no signal.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigil_common::events::{ChannelEvent, SubscribePayload};

use crate::{Error, Result};

/// Signal buffer between the socket task and the consumer
pub const SIGNAL_BUFFER: usize = 64;

/// Subscription type sent on every (re)connect
pub const DASHBOARD_SUBSCRIPTION: &str = "dashboard";

/// Handshake timeout for one connection attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    Connected,
    Disconnected { reason: String },
    Event(ChannelEvent),
    /// A text frame arrived but was not a push envelope
    Malformed { error: String },
}

/// Where and how to open the push channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// `ws://` or `wss://` endpoint
    pub url: String,
    /// Bearer token; `None` connects unauthenticated
    pub token: Option<String>,
    pub reconnect_delay: Duration,
}

/// Source of push-channel signals
pub trait Transport: Send + Sync {
    /// Start delivering signals until `cancel` fires
    fn open(&self, cancel: CancellationToken) -> mpsc::Receiver<TransportSignal>;
}

/// WebSocket transport with fixed-delay reconnection
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    config: ChannelConfig,
}

impl WebSocketTransport {
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, cancel: CancellationToken) -> mpsc::Receiver<TransportSignal> {
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        tokio::spawn(run(self.config.clone(), tx, cancel));
        rx
    }
}

enum PumpEnd {
    Cancelled,
    ConsumerGone,
    Closed(String),
}

async fn run(config: ChannelConfig, tx: mpsc::Sender<TransportSignal>, cancel: CancellationToken) {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = connect(&config) => outcome,
        };

        match outcome {
            Ok(socket) => {
                info!("Push channel connected to {} (attempt {})", config.url, attempt);
                attempt = 0;
                if tx.send(TransportSignal::Connected).await.is_err() {
                    return;
                }
                match pump(socket, &tx, &cancel).await {
                    PumpEnd::Cancelled | PumpEnd::ConsumerGone => return,
                    PumpEnd::Closed(reason) => {
                        warn!("Push channel disconnected: {}", reason);
                        if tx.send(TransportSignal::Disconnected { reason }).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Push channel connect attempt {} failed: {}", attempt, e);
            }
        }

        debug!("Reconnecting in {:?}", config.reconnect_delay);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

async fn connect(config: &ChannelConfig) -> Result<Socket> {
    let mut request = config.url.as_str().into_client_request()?;
    if let Some(token) = &config.token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request)).await {
        Ok(Ok((socket, _response))) => Ok(socket),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "push channel handshake timed out",
        ))),
    }
}

/// Forward frames until the socket ends, the consumer goes away, or cancel
async fn pump(
    socket: Socket,
    tx: &mpsc::Sender<TransportSignal>,
    cancel: &CancellationToken,
) -> PumpEnd {
    let (mut write, mut read) = socket.split();

    let subscribe = ChannelEvent::AnalyticsSubscribe(SubscribePayload {
        kind: DASHBOARD_SUBSCRIPTION.to_string(),
    });
    match subscribe.to_json() {
        Ok(text) => {
            if let Err(e) = write.send(Message::Text(text)).await {
                return PumpEnd::Closed(e.to_string());
            }
        }
        Err(e) => warn!("Failed to encode analytics subscription: {}", e),
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // Best effort; the socket is dropped either way
                let _ = write.send(Message::Close(None)).await;
                return PumpEnd::Cancelled;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match ChannelEvent::from_json(&text) {
                    Ok(event) => {
                        if tx.send(TransportSignal::Event(event)).await.is_err() {
                            return PumpEnd::ConsumerGone;
                        }
                    }
                    Err(e) => {
                        warn!("Undecodable push frame: {}", e);
                        let signal = TransportSignal::Malformed { error: e.to_string() };
                        if tx.send(signal).await.is_err() {
                            return PumpEnd::ConsumerGone;
                        }
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return PumpEnd::Closed(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return PumpEnd::Closed(e.to_string()),
                None => return PumpEnd::Closed("stream ended".to_string()),
            }
        }
    }
}
