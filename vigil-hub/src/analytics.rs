//! Analytics aggregation over stored reports

use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use vigil_common::analytics::{
    percentage, AnalyticsSnapshot, CategoryCount, DailyCount, LocationCount, RealTimeMetrics,
    StatusCount, TrendAnalytics, WeeklyCount,
};
use vigil_common::models::{Report, ReportStatus};
use vigil_common::time::start_of_day;

/// Days covered by the daily trend series
pub const DAILY_WINDOW_DAYS: i64 = 30;
/// Weeks covered by the weekly trend series
pub const WEEKLY_WINDOW_WEEKS: i64 = 12;

/// Build a snapshot from every stored report
///
/// `active_users` is supplied by the caller (connected push-channel sockets).
pub fn compute_snapshot(reports: &[Report], now: DateTime<Utc>, active_users: u64) -> AnalyticsSnapshot {
    let today = start_of_day(now);
    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let month_start = today - Duration::days(i64::from(today.day0()));
    let hour_ago = now - Duration::hours(1);
    let day_ago = now - Duration::hours(24);

    let total = reports.len() as u64;
    let count_since = |since: DateTime<Utc>| reports.iter().filter(|r| r.created_at >= since).count() as u64;

    AnalyticsSnapshot {
        total_reports: total,
        reports_today: count_since(today),
        reports_this_week: count_since(week_start),
        reports_this_month: count_since(month_start),
        category_breakdown: category_breakdown(reports),
        status_breakdown: status_breakdown(reports),
        location_breakdown: location_breakdown(reports),
        real_time_metrics: RealTimeMetrics {
            reports_last_hour: count_since(hour_ago),
            reports_last24_hours: count_since(day_ago),
            active_users,
            pending_reports: reports
                .iter()
                .filter(|r| r.status == ReportStatus::Pending)
                .count() as u64,
            urgent_reports: reports
                .iter()
                .filter(|r| r.is_urgent() && r.status.is_open())
                .count() as u64,
            average_response_time_hours: average_response_hours(reports),
        },
        trend_analytics: trends(reports, today),
    }
}

fn category_breakdown(reports: &[Report]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    for report in reports {
        *counts.entry(report.category.as_str()).or_default() += 1;
    }
    let total = reports.len() as u64;

    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

fn status_breakdown(reports: &[Report]) -> Vec<StatusCount> {
    let total = reports.len() as u64;
    ReportStatus::ALL
        .iter()
        .map(|status| {
            let count = reports.iter().filter(|r| r.status == *status).count() as u64;
            StatusCount {
                status: status.as_str().to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

fn location_breakdown(reports: &[Report]) -> Vec<LocationCount> {
    let mut by_location: BTreeMap<&str, BTreeMap<String, u64>> = BTreeMap::new();
    for report in reports {
        *by_location
            .entry(report.location.as_str())
            .or_default()
            .entry(report.category.as_str().to_string())
            .or_default() += 1;
    }
    let total = reports.len() as u64;

    let mut breakdown: Vec<LocationCount> = by_location
        .into_iter()
        .map(|(location, categories)| {
            let count = categories.values().sum();
            LocationCount {
                location: location.to_string(),
                count,
                percentage: percentage(count, total),
                categories,
            }
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
    breakdown
}

/// Mean hours from submission to a terminal status
fn average_response_hours(reports: &[Report]) -> f64 {
    let closed: Vec<f64> = reports
        .iter()
        .filter(|r| !r.status.is_open())
        .map(|r| (r.updated_at - r.created_at).num_seconds().max(0) as f64 / 3600.0)
        .collect();

    if closed.is_empty() {
        return 0.0;
    }
    let mean = closed.iter().sum::<f64>() / closed.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn trends(reports: &[Report], today: DateTime<Utc>) -> TrendAnalytics {
    let daily_start = today - Duration::days(DAILY_WINDOW_DAYS - 1);
    let weekly_start = today - Duration::weeks(WEEKLY_WINDOW_WEEKS);

    // BTreeMap keys keep both series ascending
    let mut daily: BTreeMap<String, u64> = BTreeMap::new();
    let mut weekly: BTreeMap<String, u64> = BTreeMap::new();

    for report in reports {
        if report.created_at >= daily_start {
            *daily
                .entry(report.created_at.format("%Y-%m-%d").to_string())
                .or_default() += 1;
        }
        if report.created_at >= weekly_start {
            let week = report.created_at.iso_week();
            *weekly
                .entry(format!("{}-W{:02}", week.year(), week.week()))
                .or_default() += 1;
        }
    }

    TrendAnalytics {
        daily: daily
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        weekly: weekly
            .into_iter()
            .map(|(week, count)| WeeklyCount { week, count })
            .collect(),
    }
}
