//! Report queries

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;
use vigil_common::models::{Report, ReportStatus, URGENT_THRESHOLD};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, FromRow)]
struct ReportRow {
    id: String,
    title: String,
    description: String,
    category: String,
    status: String,
    urgency_level: i64,
    location: String,
    anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = ApiError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| ApiError::Internal(format!("corrupt {} in report {}", what, row.id));
        Ok(Report {
            id: Uuid::parse_str(&row.id).map_err(|_| corrupt("id"))?,
            category: row.category.parse().map_err(|_| corrupt("category"))?,
            status: row.status.parse().map_err(|_| corrupt("status"))?,
            urgency_level: u32::try_from(row.urgency_level).map_err(|_| corrupt("urgency"))?,
            title: row.title,
            description: row.description,
            location: row.location,
            anonymous: row.anonymous,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_REPORT: &str = "SELECT id, title, description, category, status, urgency_level, \
     location, anonymous, created_at, updated_at FROM reports";

pub async fn insert_report(pool: &SqlitePool, report: &Report) -> ApiResult<()> {
    sqlx::query(
        "INSERT INTO reports (id, title, description, category, status, urgency_level, \
         location, anonymous, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(report.id.to_string())
    .bind(&report.title)
    .bind(&report.description)
    .bind(report.category.as_str())
    .bind(report.status.as_str())
    .bind(i64::from(report.urgency_level))
    .bind(&report.location)
    .bind(report.anonymous)
    .bind(report.created_at)
    .bind(report.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_report(pool: &SqlitePool, id: Uuid) -> ApiResult<Report> {
    let row: Option<ReportRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_REPORT))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| ApiError::NotFound(format!("report {}", id)))?
        .try_into()
}

/// All reports, newest first
pub async fn list_reports(pool: &SqlitePool) -> ApiResult<Vec<Report>> {
    let rows: Vec<ReportRow> =
        sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_REPORT))
            .fetch_all(pool)
            .await?;

    rows.into_iter().map(Report::try_from).collect()
}

/// Apply a validated status transition and return the updated report
pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    next: ReportStatus,
    now: DateTime<Utc>,
) -> ApiResult<Report> {
    let mut report = get_report(pool, id).await?;
    let previous = report.status;
    report.status = previous.transition_to(next)?;
    report.updated_at = now;

    // Guard on the previous status so a concurrent change loses cleanly
    let result = sqlx::query(
        "UPDATE reports SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(report.status.as_str())
    .bind(report.updated_at)
    .bind(id.to_string())
    .bind(previous.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(format!("report {} changed concurrently", id)));
    }
    Ok(report)
}

/// Pending or under-review reports at or above the urgency threshold
///
/// Reports already under investigation have an owner and are not counted.
pub async fn count_open_urgent(pool: &SqlitePool) -> ApiResult<u64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE urgency_level >= ? \
         AND status IN ('pending', 'under_review')",
    )
    .bind(i64::from(URGENT_THRESHOLD))
    .fetch_one(pool)
    .await?;
    Ok(count.max(0) as u64)
}
