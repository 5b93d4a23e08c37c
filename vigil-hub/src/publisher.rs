//! Push-event publication after report mutations
//!
//! Handlers call these after a mutation commits. Emission is lossy: having
//! no connected clients is normal and never fails the request.

use tracing::{debug, warn};
use vigil_common::events::{
    ChannelEvent, ReportNewPayload, ReportStatusPayload, UrgentAlertPayload,
};
use vigil_common::models::Report;

use crate::analytics::compute_snapshot;
use crate::db;
use crate::error::ApiResult;
use crate::AppState;

/// `report:new`, then `report:urgent` for high-urgency reports, then a full
/// `analytics:update`
pub async fn report_created(state: &AppState, report: &Report) -> ApiResult<()> {
    state.events.emit_lossy(ChannelEvent::ReportNew(ReportNewPayload {
        id: Some(report.id.to_string()),
        title: report.title.clone(),
        category: report.category.as_str().to_string(),
        urgency_level: report.urgency_level,
        location: Some(report.location.clone()),
        ..Default::default()
    }));

    if report.is_urgent() {
        let count = db::count_open_urgent(&state.db).await?;
        debug!("Urgent report {} raised open urgent count to {}", report.id, count);
        state.events.emit_lossy(ChannelEvent::ReportUrgent(UrgentAlertPayload {
            count,
            report_id: Some(report.id.to_string()),
            title: Some(report.title.clone()),
        }));
    }

    analytics_changed(state).await
}

/// `report:status:public`, then a full `analytics:update`
pub async fn status_changed(state: &AppState, report: &Report) -> ApiResult<()> {
    state.events.emit_lossy(ChannelEvent::ReportStatus(ReportStatusPayload {
        id: Some(report.id.to_string()),
        status: report.status.as_str().to_string(),
        ..Default::default()
    }));
    analytics_changed(state).await
}

/// Recompute and broadcast the analytics snapshot
///
/// Skipped when nobody is listening.
pub async fn analytics_changed(state: &AppState) -> ApiResult<()> {
    if state.events.subscriber_count() == 0 {
        return Ok(());
    }

    let reports = db::list_reports(&state.db).await?;
    let active_users = state.events.subscriber_count() as u64;
    let snapshot = compute_snapshot(&reports, vigil_common::time::now(), active_users);

    if let Err(e) = state
        .events
        .emit(ChannelEvent::AnalyticsUpdate(Box::new(snapshot)))
    {
        warn!("analytics:update dropped, subscribers left: {}", e);
    }
    Ok(())
}
