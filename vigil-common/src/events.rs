//! Push-channel event types
//!
//! Every frame on the push channel is an [`Envelope`]: an event name plus a
//! JSON payload. [`ChannelEvent`] is the typed view of an envelope. Payload
//! structs default missing, `null` and mistyped fields and keep unrecognized
//! ones in `extra`, so a server that sends more (or less) than expected never
//! breaks a client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::analytics::AnalyticsSnapshot;
use crate::lenient;

pub const REPORT_NEW: &str = "report:new";
pub const REPORT_STATUS_PUBLIC: &str = "report:status:public";
pub const REPORT_URGENT: &str = "report:urgent";
pub const ANALYTICS_UPDATE: &str = "analytics:update";
pub const LOCATION_UPDATE: &str = "location:update";
pub const SYSTEM_NOTIFICATION: &str = "system:notification";
pub const ANALYTICS_SUBSCRIBE: &str = "analytics:subscribe";

/// Wire frame: `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Notification severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Parse a priority name, falling back to `Medium` for anything unknown
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("low") => Priority::Low,
            Some("high") => Priority::High,
            Some("critical") => Priority::Critical,
            _ => Priority::Medium,
        }
    }

    /// Priority for a newly submitted report, by urgency level (1-10)
    pub fn from_urgency(urgency_level: u32) -> Self {
        match urgency_level {
            8.. => Priority::Critical,
            6..=7 => Priority::High,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `report:new`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportNewPayload {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub title: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub category: String,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub urgency_level: u32,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `report:status:public`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportStatusPayload {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `report:urgent`: aggregated alert over open high-urgency reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrgentAlertPayload {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub title: Option<String>,
}

/// `location:update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdatePayload {
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `system:notification`
///
/// `priority` is kept as raw text; see [`SystemNotificationPayload::priority`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemNotificationPayload {
    #[serde(deserialize_with = "lenient::or_default")]
    pub title: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub message: String,
    #[serde(rename = "priority", skip_serializing_if = "Option::is_none", deserialize_with = "lenient::or_default")]
    pub raw_priority: Option<String>,
}

impl SystemNotificationPayload {
    pub fn priority(&self) -> Priority {
        Priority::parse_or_default(self.raw_priority.as_deref())
    }
}

/// `analytics:subscribe` (client to server)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribePayload {
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub kind: String,
}

/// Typed push-channel event
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    ReportNew(ReportNewPayload),
    ReportStatus(ReportStatusPayload),
    ReportUrgent(UrgentAlertPayload),
    AnalyticsUpdate(Box<AnalyticsSnapshot>),
    LocationUpdate(LocationUpdatePayload),
    SystemNotification(SystemNotificationPayload),
    AnalyticsSubscribe(SubscribePayload),
    /// Event name this build does not know; passed through untouched
    Unknown { event: String, data: Value },
}

impl ChannelEvent {
    /// Wire name of the event
    pub fn name(&self) -> &str {
        match self {
            ChannelEvent::ReportNew(_) => REPORT_NEW,
            ChannelEvent::ReportStatus(_) => REPORT_STATUS_PUBLIC,
            ChannelEvent::ReportUrgent(_) => REPORT_URGENT,
            ChannelEvent::AnalyticsUpdate(_) => ANALYTICS_UPDATE,
            ChannelEvent::LocationUpdate(_) => LOCATION_UPDATE,
            ChannelEvent::SystemNotification(_) => SYSTEM_NOTIFICATION,
            ChannelEvent::AnalyticsSubscribe(_) => ANALYTICS_SUBSCRIBE,
            ChannelEvent::Unknown { event, .. } => event,
        }
    }

    /// Decode an envelope into a typed event
    ///
    /// A payload that is not an object decodes as an empty one, so every
    /// field of a known event falls back to its default. Unknown events keep
    /// their payload as sent.
    pub fn from_envelope(envelope: Envelope) -> crate::Result<Self> {
        let Envelope { event, data } = envelope;
        let decoded = match event.as_str() {
            REPORT_NEW => ChannelEvent::ReportNew(decode_fields(data)?),
            REPORT_STATUS_PUBLIC => ChannelEvent::ReportStatus(decode_fields(data)?),
            REPORT_URGENT => ChannelEvent::ReportUrgent(decode_fields(data)?),
            ANALYTICS_UPDATE => ChannelEvent::AnalyticsUpdate(Box::new(decode_fields(data)?)),
            LOCATION_UPDATE => ChannelEvent::LocationUpdate(decode_fields(data)?),
            SYSTEM_NOTIFICATION => ChannelEvent::SystemNotification(decode_fields(data)?),
            ANALYTICS_SUBSCRIBE => ChannelEvent::AnalyticsSubscribe(decode_fields(data)?),
            _ => ChannelEvent::Unknown { event, data },
        };
        Ok(decoded)
    }

    /// Encode as a wire envelope
    pub fn to_envelope(&self) -> crate::Result<Envelope> {
        let data = match self {
            ChannelEvent::ReportNew(p) => serde_json::to_value(p)?,
            ChannelEvent::ReportStatus(p) => serde_json::to_value(p)?,
            ChannelEvent::ReportUrgent(p) => serde_json::to_value(p)?,
            ChannelEvent::AnalyticsUpdate(p) => serde_json::to_value(p)?,
            ChannelEvent::LocationUpdate(p) => serde_json::to_value(p)?,
            ChannelEvent::SystemNotification(p) => serde_json::to_value(p)?,
            ChannelEvent::AnalyticsSubscribe(p) => serde_json::to_value(p)?,
            ChannelEvent::Unknown { data, .. } => data.clone(),
        };
        Ok(Envelope {
            event: self.name().to_string(),
            data,
        })
    }

    /// Decode a text frame
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::from_envelope(envelope)
    }

    /// Encode as a text frame
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.to_envelope()?)?)
    }
}

/// Decode a known payload; anything other than an object counts as empty
fn decode_fields<T: DeserializeOwned>(data: Value) -> crate::Result<T> {
    let fields = match data {
        Value::Object(_) => data,
        _ => Value::Object(Map::new()),
    };
    Ok(serde_json::from_value(fields)?)
}

/// Central event distribution for the hub
///
/// Thin wrapper around a tokio broadcast channel. Each WebSocket connection
/// holds its own receiver; a slow connection lags and skips events rather than
/// blocking the emitter.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChannelEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ChannelEvent,
    ) -> Result<usize, broadcast::error::SendError<ChannelEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ChannelEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
