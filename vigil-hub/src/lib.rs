//! vigil-hub library - report intake and push-event source
//!
//! Accepts report submissions and staff triage over HTTP, keeps reports in
//! SQLite, and fans typed events out to every WebSocket client on `/ws`.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vigil_common::events::EventBus;

pub mod analytics;
pub mod api;
pub mod db;
pub mod error;
pub mod publisher;

/// Buffered events per WebSocket connection before it starts lagging
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Report store
    pub db: SqlitePool,
    /// Push-event fan-out; one receiver per connected socket
    pub events: EventBus,
    /// Staff bearer token; `None` closes staff routes entirely
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, api_token: Option<String>) -> Self {
        Self {
            db,
            events: EventBus::new(EVENT_BUS_CAPACITY),
            api_token,
        }
    }
}

/// Build application router
///
/// Public: health, analytics snapshot, report submission, push channel.
/// Staff (bearer token): report listing, triage, broadcast notifications.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    let staff = Router::new()
        .route("/api/reports", get(api::list_reports))
        .route("/api/reports/:id", get(api::get_report))
        .route("/api/reports/:id/status", patch(api::update_report_status))
        .route("/api/notifications", post(api::post_system_notification))
        .route("/api/locations/:location/alerts", post(api::post_location_alert))
        .layer(middleware::from_fn_with_state(state.clone(), api::require_staff));

    let public = Router::new()
        .route("/api/analytics", get(api::get_analytics))
        .route("/api/reports", post(api::create_report))
        .route("/ws", get(api::ws_upgrade))
        .merge(api::health_routes());

    Router::new()
        .merge(staff)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
