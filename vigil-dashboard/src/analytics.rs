//! Analytics view model
//!
//! One snapshot fetch on mount. Afterwards the held snapshot is patched by
//! `report:new` deltas and replaced wholesale by `analytics:update`. A delta
//! that arrives while no snapshot is held is dropped; whichever of a pending
//! fetch or a later full update lands last wins.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use vigil_common::api::ApiResponse;
use vigil_common::events::ChannelEvent;
use vigil_common::AnalyticsSnapshot;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("vigil-dashboard/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the analytics snapshot comes from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<AnalyticsSnapshot>;
}

/// `GET /api/analytics` over HTTP
pub struct HttpSnapshotSource {
    http_client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpSnapshotSource {
    pub fn new(server_url: &str, token: Option<String>) -> Result<Self> {
        let base = server_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidUrl(server_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            url: format!("{}/api/analytics", base),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<AnalyticsSnapshot> {
        let mut request = self.http_client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: ApiResponse<AnalyticsSnapshot> = response.json().await?;
        body.into_data()
            .map_err(|message| Error::Snapshot(format!("{} ({})", message, status)))
    }
}

/// Load state of the analytics panel
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalyticsPhase {
    #[default]
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsView {
    phase: AnalyticsPhase,
    snapshot: Option<AnalyticsSnapshot>,
    in_flight: bool,
}

impl AnalyticsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch; refused while another one is pending
    pub fn begin_fetch(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.phase = AnalyticsPhase::Loading;
        true
    }

    pub fn apply_fetch(&mut self, result: Result<AnalyticsSnapshot>) {
        self.in_flight = false;
        match result {
            Ok(snapshot) => {
                info!("Analytics snapshot loaded: {} reports", snapshot.total_reports);
                self.snapshot = Some(snapshot);
                self.phase = AnalyticsPhase::Ready;
            }
            Err(e) => {
                warn!("Analytics snapshot failed: {}", e);
                self.phase = AnalyticsPhase::Error(e.to_string());
            }
        }
    }

    /// Apply a push event; returns whether the held snapshot changed
    pub fn apply_event(&mut self, event: &ChannelEvent) -> bool {
        match event {
            ChannelEvent::ReportNew(_) => match self.snapshot.as_mut() {
                Some(snapshot) => {
                    snapshot.apply_new_report();
                    true
                }
                None => {
                    debug!("report:new before any snapshot; delta dropped");
                    false
                }
            },
            ChannelEvent::AnalyticsUpdate(snapshot) => {
                self.snapshot = Some(snapshot.as_ref().clone());
                self.phase = AnalyticsPhase::Ready;
                true
            }
            _ => false,
        }
    }

    /// Manual retry is offered only after a failed fetch
    pub fn can_retry(&self) -> bool {
        matches!(self.phase, AnalyticsPhase::Error(_)) && !self.in_flight
    }

    pub fn phase(&self) -> &AnalyticsPhase {
        &self.phase
    }

    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::events::ReportNewPayload;

    fn snapshot(total: u64) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            total_reports: total,
            reports_today: 2,
            ..Default::default()
        }
    }

    fn report_new() -> ChannelEvent {
        ChannelEvent::ReportNew(ReportNewPayload {
            title: "Report".to_string(),
            urgency_level: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_fetch_then_delta() {
        let mut view = AnalyticsView::new();
        assert!(view.begin_fetch());
        assert_eq!(view.phase(), &AnalyticsPhase::Loading);

        view.apply_fetch(Ok(snapshot(10)));
        assert_eq!(view.phase(), &AnalyticsPhase::Ready);

        assert!(view.apply_event(&report_new()));
        let held = view.snapshot().unwrap();
        assert_eq!(held.total_reports, 11);
        assert_eq!(held.reports_today, 3);
        assert_eq!(held.real_time_metrics.reports_last_hour, 1);
        assert_eq!(held.real_time_metrics.reports_last24_hours, 1);
    }

    #[test]
    fn test_delta_without_snapshot_is_dropped() {
        let mut view = AnalyticsView::new();
        view.begin_fetch();

        assert!(!view.apply_event(&report_new()));
        assert!(view.snapshot().is_none());

        // The fetch that lands afterwards wins, without the early delta
        view.apply_fetch(Ok(snapshot(10)));
        assert_eq!(view.snapshot().unwrap().total_reports, 10);
    }

    #[test]
    fn test_full_update_replaces_snapshot() {
        let mut view = AnalyticsView::new();
        view.begin_fetch();
        view.apply_fetch(Ok(snapshot(10)));

        let update = ChannelEvent::AnalyticsUpdate(Box::new(snapshot(40)));
        assert!(view.apply_event(&update));
        assert_eq!(view.snapshot().unwrap().total_reports, 40);
    }

    #[test]
    fn test_full_update_recovers_from_error() {
        let mut view = AnalyticsView::new();
        view.begin_fetch();
        view.apply_fetch(Err(Error::Snapshot("database offline".to_string())));
        assert!(matches!(view.phase(), AnalyticsPhase::Error(m) if m.contains("database offline")));

        view.apply_event(&ChannelEvent::AnalyticsUpdate(Box::new(snapshot(3))));
        assert_eq!(view.phase(), &AnalyticsPhase::Ready);
    }

    #[test]
    fn test_retry_only_after_error() {
        let mut view = AnalyticsView::new();
        assert!(!view.can_retry());

        view.begin_fetch();
        assert!(!view.begin_fetch());
        view.apply_fetch(Err(Error::Snapshot("boom".to_string())));
        assert!(view.can_retry());

        assert!(view.begin_fetch());
        assert!(!view.can_retry());
        view.apply_fetch(Ok(snapshot(1)));
        assert!(!view.can_retry());
    }

    #[test]
    fn test_other_events_ignored() {
        let mut view = AnalyticsView::new();
        view.begin_fetch();
        view.apply_fetch(Ok(snapshot(5)));

        let event = ChannelEvent::Unknown {
            event: "report:deleted".to_string(),
            data: serde_json::Value::Null,
        };
        assert!(!view.apply_event(&event));
        assert_eq!(view.snapshot().unwrap().total_reports, 5);
    }

    #[test]
    fn test_http_source_rejects_non_http_url() {
        assert!(matches!(
            HttpSnapshotSource::new("ftp://example.org", None),
            Err(Error::InvalidUrl(_))
        ));
        let source = HttpSnapshotSource::new("http://127.0.0.1:5780/", None).unwrap();
        assert_eq!(source.url(), "http://127.0.0.1:5780/api/analytics");
    }
}
