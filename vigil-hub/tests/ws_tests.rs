//! Push channel tests against a real listener

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use vigil_common::analytics::AnalyticsSnapshot;
use vigil_common::events::{ChannelEvent, SubscribePayload, SystemNotificationPayload};
use vigil_hub::{build_router, db, AppState};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_hub() -> (AppState, SocketAddr) {
    let pool = db::connect_in_memory().await.unwrap();
    let state = AppState::new(pool, Some("staff-token".to_string()));
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr)
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Should open push channel");
    socket
}

async fn next_event(socket: &mut Socket) -> ChannelEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Socket closed")
            .expect("Socket error");
        if let Message::Text(text) = frame {
            return ChannelEvent::from_json(&text).expect("Should decode frame");
        }
    }
}

fn system(title: &str) -> ChannelEvent {
    ChannelEvent::SystemNotification(SystemNotificationPayload {
        title: title.to_string(),
        message: "body".to_string(),
        raw_priority: None,
    })
}

#[tokio::test]
async fn test_public_events_reach_every_socket() {
    let (state, addr) = start_hub().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    state.events.emit_lossy(system("hello"));

    assert_eq!(next_event(&mut first).await, system("hello"));
    assert_eq!(next_event(&mut second).await, system("hello"));
}

#[tokio::test]
async fn test_analytics_only_for_dashboard_subscribers() {
    let (state, addr) = start_hub().await;
    let mut dashboard = connect(addr).await;
    let mut citizen = connect(addr).await;

    let subscribe = ChannelEvent::AnalyticsSubscribe(SubscribePayload {
        kind: "dashboard".to_string(),
    });
    dashboard
        .send(Message::Text(subscribe.to_json().unwrap()))
        .await
        .unwrap();
    // Let the hub process the subscription frame
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = AnalyticsSnapshot {
        total_reports: 7,
        ..Default::default()
    };
    state
        .events
        .emit_lossy(ChannelEvent::AnalyticsUpdate(Box::new(snapshot.clone())));
    state.events.emit_lossy(system("after"));

    assert_eq!(
        next_event(&mut dashboard).await,
        ChannelEvent::AnalyticsUpdate(Box::new(snapshot))
    );
    assert_eq!(next_event(&mut dashboard).await, system("after"));

    // The citizen socket never sees the analytics frame
    assert_eq!(next_event(&mut citizen).await, system("after"));
}

#[tokio::test]
async fn test_connected_sockets_count_as_active_users() {
    let (state, addr) = start_hub().await;
    let _a = connect(addr).await;
    let _b = connect(addr).await;

    assert_eq!(state.events.subscriber_count(), 2);
}
