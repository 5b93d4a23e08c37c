//! Report submission and staff triage

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;
use vigil_common::api::ApiResponse;
use vigil_common::models::{NewReport, Report, StatusUpdate};

use crate::error::{ApiError, ApiResult};
use crate::{db, publisher, AppState};

/// POST /api/reports
///
/// Public. Validates, stores with status `pending`, and publishes
/// `report:new` (plus `report:urgent` when urgency is high).
pub async fn create_report(
    State(state): State<AppState>,
    body: Result<Json<NewReport>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Report>>)> {
    let Json(submission) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let report = submission.validate()?.into_report(vigil_common::time::now());

    db::insert_report(&state.db, &report).await?;
    info!(
        "Report {} submitted: category={}, urgency={}",
        report.id, report.category, report.urgency_level
    );

    // Already stored; publication failures are only logged
    if let Err(e) = publisher::report_created(&state, &report).await {
        warn!("Failed to publish report {}: {}", report.id, e);
    }
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(report))))
}

/// GET /api/reports (staff)
pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Report>>>> {
    let reports = db::list_reports(&state.db).await?;
    Ok(Json(ApiResponse::ok(reports)))
}

/// GET /api/reports/:id (staff)
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Report>>> {
    let report = db::get_report(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// PATCH /api/reports/:id/status (staff)
///
/// 409 when the transition is not allowed from the current status.
pub async fn update_report_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Report>>> {
    let Json(update) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let report = db::update_status(&state.db, id, update.status, vigil_common::time::now()).await?;
    info!("Report {} moved to {}", report.id, report.status);

    if let Err(e) = publisher::status_changed(&state, &report).await {
        warn!("Failed to publish status change for {}: {}", report.id, e);
    }
    Ok(Json(ApiResponse::ok(report)))
}
