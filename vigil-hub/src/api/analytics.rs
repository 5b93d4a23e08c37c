//! Analytics snapshot endpoint

use axum::{extract::State, Json};
use vigil_common::analytics::AnalyticsSnapshot;
use vigil_common::api::ApiResponse;

use crate::analytics::compute_snapshot;
use crate::error::ApiResult;
use crate::{db, AppState};

/// GET /api/analytics
///
/// `activeUsers` counts currently connected push-channel sockets.
pub async fn get_analytics(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AnalyticsSnapshot>>> {
    let reports = db::list_reports(&state.db).await?;
    let active_users = state.events.subscriber_count() as u64;
    let snapshot = compute_snapshot(&reports, vigil_common::time::now(), active_users);
    Ok(Json(ApiResponse::ok(snapshot)))
}
