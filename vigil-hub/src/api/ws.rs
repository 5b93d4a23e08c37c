//! WebSocket push channel
//!
//! Each socket gets its own EventBus receiver. Public events go to everyone;
//! `analytics:update` only goes to sockets that sent `analytics:subscribe`
//! with `{"type": "dashboard"}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use vigil_common::events::ChannelEvent;

use super::auth::is_staff;
use crate::AppState;

/// GET /ws
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let staff = is_staff(&state, &headers);
    // Subscribe before the handshake completes so nothing emitted in between is lost
    let rx = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, staff))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<ChannelEvent>, staff: bool) {
    info!("Push channel client connected (staff: {})", staff);
    let (mut sender, mut receiver) = socket.split();
    let mut dashboard = false;

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ChannelEvent::from_json(&text) {
                    Ok(ChannelEvent::AnalyticsSubscribe(subscription)) => {
                        dashboard = subscription.kind == "dashboard";
                        debug!("Client subscribed to analytics: {}", subscription.kind);
                    }
                    Ok(other) => debug!("Ignoring client event {}", other.name()),
                    Err(e) => warn!("Malformed client frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Push channel read error: {}", e);
                    break;
                }
            },
            event = rx.recv() => match event {
                Ok(event) => {
                    if matches!(event, ChannelEvent::AnalyticsUpdate(_)) && !dashboard {
                        continue;
                    }
                    let text = match event.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode {}: {}", event.name(), e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Push channel client lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Push channel client disconnected");
}
