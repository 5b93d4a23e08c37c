//! HTTP API handlers for vigil-hub

pub mod analytics;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod reports;
pub mod ws;

pub use analytics::get_analytics;
pub use auth::require_staff;
pub use health::health_routes;
pub use notifications::{post_location_alert, post_system_notification};
pub use reports::{create_report, get_report, list_reports, update_report_status};
pub use ws::ws_upgrade;
