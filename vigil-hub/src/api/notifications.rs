//! Staff broadcasts: system notifications and location alerts

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_common::api::ApiResponse;
use vigil_common::events::{ChannelEvent, LocationUpdatePayload, SystemNotificationPayload};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Number of sockets an event was handed to
#[derive(Debug, Serialize, Deserialize)]
pub struct Delivery {
    pub delivered: usize,
}

/// Body of `POST /api/locations/:location/alerts`
#[derive(Debug, Deserialize)]
pub struct LocationAlert {
    pub message: String,
}

/// POST /api/notifications (staff)
///
/// Body `{title, message, priority?}` is broadcast as `system:notification`.
pub async fn post_system_notification(
    State(state): State<AppState>,
    body: Result<Json<SystemNotificationPayload>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Delivery>>> {
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    info!("System notification ({}): {}", payload.priority(), payload.title);
    let delivered = broadcast(&state, ChannelEvent::SystemNotification(payload));
    Ok(Json(ApiResponse::ok(Delivery { delivered })))
}

/// POST /api/locations/:location/alerts (staff)
pub async fn post_location_alert(
    State(state): State<AppState>,
    Path(location): Path<String>,
    body: Result<Json<LocationAlert>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Delivery>>> {
    let Json(alert) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    info!("Location alert for {}", location);
    let delivered = broadcast(
        &state,
        ChannelEvent::LocationUpdate(LocationUpdatePayload {
            kind: "alert".to_string(),
            location: Some(location),
            message: Some(alert.message),
            ..Default::default()
        }),
    );
    Ok(Json(ApiResponse::ok(Delivery { delivered })))
}

fn broadcast(state: &AppState, event: ChannelEvent) -> usize {
    state.events.emit(event).unwrap_or(0)
}
