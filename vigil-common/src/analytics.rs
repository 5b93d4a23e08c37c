//! Analytics snapshot model
//!
//! The snapshot is produced by the hub (`GET /api/analytics` and the
//! `analytics:update` push event) and held by the dashboard view model.
//! Every field defaults when absent, `null` or of the wrong type, so a
//! partially populated payload still deserializes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lenient;

/// Complete point-in-time analytics aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSnapshot {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub total_reports: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub reports_today: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub reports_this_week: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub reports_this_month: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub category_breakdown: Vec<CategoryCount>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub status_breakdown: Vec<StatusCount>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub location_breakdown: Vec<LocationCount>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub real_time_metrics: RealTimeMetrics,
    #[serde(deserialize_with = "lenient::or_default")]
    pub trend_analytics: TrendAnalytics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryCount {
    #[serde(deserialize_with = "lenient::or_default")]
    pub category: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusCount {
    #[serde(deserialize_with = "lenient::or_default")]
    pub status: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub percentage: f64,
}

/// Per-location totals with a nested per-category breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationCount {
    #[serde(deserialize_with = "lenient::or_default")]
    pub location: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub percentage: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub categories: BTreeMap<String, u64>,
}

/// Rolling-window counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RealTimeMetrics {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub reports_last_hour: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub reports_last24_hours: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub active_users: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub pending_reports: u64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub urgent_reports: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub average_response_time_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendAnalytics {
    /// Ascending by date
    #[serde(deserialize_with = "lenient::or_default")]
    pub daily: Vec<DailyCount>,
    /// Ascending by ISO week
    #[serde(deserialize_with = "lenient::or_default")]
    pub weekly: Vec<WeeklyCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    #[serde(deserialize_with = "lenient::or_default")]
    pub date: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyCount {
    /// `YYYY-Www`
    #[serde(deserialize_with = "lenient::or_default")]
    pub week: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
}

impl AnalyticsSnapshot {
    /// Apply the delta carried by a single `report:new` event
    pub fn apply_new_report(&mut self) {
        self.total_reports += 1;
        self.reports_today += 1;
        self.real_time_metrics.reports_last_hour += 1;
        self.real_time_metrics.reports_last24_hours += 1;
    }
}

/// Share of `count` in `total` as a percentage rounded to one decimal
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((count as f64 / total as f64) * 1000.0).round() / 10.0
}
