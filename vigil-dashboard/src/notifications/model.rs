//! Notification record and the event-to-notification mapping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;
use vigil_common::events::{ChannelEvent, Priority};

/// Notification category shown by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ReportNew,
    ReportStatus,
    System,
    Location,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub priority: Priority,
    /// Raw event payload
    pub data: Value,
    /// Auto-dismiss deadline; only low-priority notifications carry one
    #[serde(skip)]
    pub expires_at: Option<Instant>,
}

impl Notification {
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
        data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            priority,
            data,
            expires_at: None,
        }
    }

    /// Build the notification for an inbound event
    ///
    /// Returns `None` for events that never notify (`analytics:update`,
    /// client-bound subscriptions, unknown names).
    pub fn from_event(event: &ChannelEvent) -> Option<Self> {
        let data = event
            .to_envelope()
            .map(|envelope| envelope.data)
            .unwrap_or(Value::Null);

        let notification = match event {
            ChannelEvent::ReportNew(report) => Self::new(
                NotificationType::ReportNew,
                "New Report Submitted",
                format!("{} - {}", or_unknown(&report.category), report.title),
                Priority::from_urgency(report.urgency_level),
                data,
            ),
            ChannelEvent::ReportStatus(status) => Self::new(
                NotificationType::ReportStatus,
                "Report Status Updated",
                match &status.id {
                    Some(id) => format!("Report {} is now {}", id, or_unknown(&status.status)),
                    None => format!("A report is now {}", or_unknown(&status.status)),
                },
                Priority::Medium,
                data,
            ),
            ChannelEvent::ReportUrgent(alert) => Self::new(
                NotificationType::Urgent,
                "Urgent Reports Need Attention",
                match &alert.title {
                    Some(title) => format!("{} open urgent report(s), latest: {}", alert.count, title),
                    None => format!("{} open urgent report(s)", alert.count),
                },
                Priority::Critical,
                data,
            ),
            ChannelEvent::LocationUpdate(update) => Self::new(
                NotificationType::Location,
                "Location Update",
                match (&update.location, &update.message) {
                    (Some(location), Some(message)) => format!("{}: {}", location, message),
                    (Some(location), None) => format!("Activity reported in {}", location),
                    (None, Some(message)) => message.clone(),
                    (None, None) => "Location activity changed".to_string(),
                },
                Priority::Medium,
                data,
            ),
            ChannelEvent::SystemNotification(system) => Self::new(
                NotificationType::System,
                system.title.clone(),
                system.message.clone(),
                system.priority(),
                data,
            ),
            ChannelEvent::AnalyticsUpdate(_)
            | ChannelEvent::AnalyticsSubscribe(_)
            | ChannelEvent::Unknown { .. } => return None,
        };
        Some(notification)
    }

    /// Critical and high notifications attempt a sound
    pub fn wants_sound(&self) -> bool {
        matches!(self.priority, Priority::Critical | Priority::High)
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}
