//! Integration tests for vigil-hub HTTP endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Report submission and validation
//! - Staff token enforcement
//! - Status transitions
//! - Analytics snapshot shape
//! - Events published on the EventBus by each mutation

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method
use vigil_common::events::ChannelEvent;
use vigil_hub::{build_router, db, AppState};

const TOKEN: &str = "staff-token";

/// Test helper: fresh in-memory store with a staff token configured
async fn setup_state() -> AppState {
    let pool = db::connect_in_memory()
        .await
        .expect("Should open in-memory database");
    AppState::new(pool, Some(TOKEN.to_string()))
}

fn app(state: &AppState) -> Router {
    build_router(state.clone())
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn submission(urgency: u32) -> Value {
    json!({
        "title": "Officer demanded cash at checkpoint",
        "description": "Happened twice this week",
        "category": "bribery",
        "urgencyLevel": urgency,
        "location": "Nairobi",
        "anonymous": true
    })
}

async fn submit(state: &AppState, urgency: u32) -> Value {
    let response = app(state)
        .oneshot(json_request("POST", "/api/reports", submission(urgency), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let state = setup_state().await;
    let response = app(&state).oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "vigil-hub");
    assert!(body["version"].is_string());
}

// =============================================================================
// Report submission
// =============================================================================

#[tokio::test]
async fn test_create_report_is_public() {
    let state = setup_state().await;
    let body = submit(&state, 4).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["category"], "bribery");
    assert_eq!(body["data"]["urgencyLevel"], 4);
    assert!(body["data"]["id"].is_string());
}

#[tokio::test]
async fn test_create_report_validation() {
    let state = setup_state().await;

    let mut bad = submission(5);
    bad["title"] = json!("   ");
    let response = app(&state)
        .oneshot(json_request("POST", "/api/reports", bad, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("title"));

    let response = app(&state)
        .oneshot(json_request("POST", "/api/reports", submission(11), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut unknown_category = submission(5);
    unknown_category["category"] = json!("littering");
    let response = app(&state)
        .oneshot(json_request("POST", "/api/reports", unknown_category, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_report_publishes_events() {
    let state = setup_state().await;
    let mut rx = state.events.subscribe();

    submit(&state, 9).await;

    match rx.recv().await.unwrap() {
        ChannelEvent::ReportNew(payload) => {
            assert_eq!(payload.urgency_level, 9);
            assert_eq!(payload.category, "bribery");
            assert_eq!(payload.location.as_deref(), Some("Nairobi"));
        }
        other => panic!("expected report:new, got {:?}", other),
    }
    match rx.recv().await.unwrap() {
        ChannelEvent::ReportUrgent(payload) => assert_eq!(payload.count, 1),
        other => panic!("expected report:urgent, got {:?}", other),
    }
    match rx.recv().await.unwrap() {
        ChannelEvent::AnalyticsUpdate(snapshot) => {
            assert_eq!(snapshot.total_reports, 1);
            assert_eq!(snapshot.real_time_metrics.urgent_reports, 1);
            assert_eq!(snapshot.real_time_metrics.active_users, 1);
        }
        other => panic!("expected analytics:update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_urgent_count_skips_reports_under_investigation() {
    let state = setup_state().await;
    let first = submit(&state, 9).await;
    let id = first["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/reports/{}/status", id);

    for status in ["under_review", "investigating"] {
        let response = app(&state)
            .oneshot(json_request("PATCH", &uri, json!({"status": status}), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let mut rx = state.events.subscribe();

    // Only the new pending report counts
    submit(&state, 8).await;
    loop {
        match rx.recv().await.unwrap() {
            ChannelEvent::ReportUrgent(payload) => {
                assert_eq!(payload.count, 1);
                break;
            }
            ChannelEvent::AnalyticsUpdate(_) => panic!("analytics:update before report:urgent"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_low_urgency_report_skips_urgent_alert() {
    let state = setup_state().await;
    let mut rx = state.events.subscribe();

    submit(&state, 3).await;

    assert!(matches!(rx.recv().await.unwrap(), ChannelEvent::ReportNew(_)));
    assert!(matches!(rx.recv().await.unwrap(), ChannelEvent::AnalyticsUpdate(_)));
}

// =============================================================================
// Staff routes
// =============================================================================

#[tokio::test]
async fn test_staff_routes_require_token() {
    let state = setup_state().await;

    let response = app(&state).oneshot(get_request("/api/reports", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);

    let response = app(&state)
        .oneshot(get_request("/api/reports", Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(&state)
        .oneshot(get_request("/api/reports", Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_staff_routes_closed_without_configured_token() {
    let pool = db::connect_in_memory().await.unwrap();
    let state = AppState::new(pool, None);

    let response = app(&state)
        .oneshot(get_request("/api/reports", Some("anything")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_and_get_reports() {
    let state = setup_state().await;
    let first = submit(&state, 2).await;
    submit(&state, 3).await;

    let response = app(&state)
        .oneshot(get_request("/api/reports", Some(TOKEN)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let id = first["data"]["id"].as_str().unwrap();
    let response = app(&state)
        .oneshot(get_request(&format!("/api/reports/{}", id), Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["id"], id);

    let response = app(&state)
        .oneshot(get_request(
            "/api/reports/00000000-0000-0000-0000-000000000000",
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_transitions() {
    let state = setup_state().await;
    let created = submit(&state, 5).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/reports/{}/status", id);

    let mut rx = state.events.subscribe();
    let response = app(&state)
        .oneshot(json_request("PATCH", &uri, json!({"status": "under_review"}), Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["status"], "under_review");

    match rx.recv().await.unwrap() {
        ChannelEvent::ReportStatus(payload) => {
            assert_eq!(payload.status, "under_review");
            assert_eq!(payload.id.as_deref(), Some(id.as_str()));
        }
        other => panic!("expected report:status:public, got {:?}", other),
    }

    // Skipping straight back to pending is not allowed
    let response = app(&state)
        .oneshot(json_request("PATCH", &uri, json!({"status": "pending"}), Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app(&state)
        .oneshot(json_request("PATCH", &uri, json!({"status": "closed"}), Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_system_notification_broadcast() {
    let state = setup_state().await;
    let mut rx = state.events.subscribe();

    let response = app(&state)
        .oneshot(json_request(
            "POST",
            "/api/notifications",
            json!({"title": "Maintenance", "message": "Back at 02:00", "priority": "low"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["delivered"], 1);

    match rx.recv().await.unwrap() {
        ChannelEvent::SystemNotification(payload) => {
            assert_eq!(payload.title, "Maintenance");
            assert_eq!(payload.raw_priority.as_deref(), Some("low"));
        }
        other => panic!("expected system:notification, got {:?}", other),
    }
}

#[tokio::test]
async fn test_location_alert_broadcast() {
    let state = setup_state().await;
    let mut rx = state.events.subscribe();

    let response = app(&state)
        .oneshot(json_request(
            "POST",
            "/api/locations/Mombasa/alerts",
            json!({"message": "Spike in extortion reports"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match rx.recv().await.unwrap() {
        ChannelEvent::LocationUpdate(payload) => {
            assert_eq!(payload.kind, "alert");
            assert_eq!(payload.location.as_deref(), Some("Mombasa"));
        }
        other => panic!("expected location:update, got {:?}", other),
    }
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_analytics_snapshot() {
    let state = setup_state().await;
    submit(&state, 9).await;
    submit(&state, 2).await;

    let response = app(&state).oneshot(get_request("/api/analytics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["totalReports"], 2);
    assert_eq!(data["reportsToday"], 2);
    assert_eq!(data["realTimeMetrics"]["reportsLastHour"], 2);
    assert_eq!(data["realTimeMetrics"]["pendingReports"], 2);
    assert_eq!(data["realTimeMetrics"]["urgentReports"], 1);
    assert_eq!(data["categoryBreakdown"][0]["category"], "bribery");
    assert_eq!(data["categoryBreakdown"][0]["percentage"], 100.0);
    assert_eq!(data["trendAnalytics"]["daily"].as_array().unwrap().len(), 1);
}
