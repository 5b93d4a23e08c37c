//! # Vigil Common Library
//!
//! Shared code for the Vigil hub and dashboard:
//! - Push-channel event types (ChannelEvent) and the EventBus
//! - Tolerant payload field decoding
//! - Analytics snapshot model
//! - Report model, validation and status transitions
//! - API response envelope
//! - Configuration loading
//! - Time helpers

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod lenient;
pub mod models;
pub mod time;

pub use analytics::AnalyticsSnapshot;
pub use error::{Error, Result};
pub use events::{ChannelEvent, Envelope, EventBus, Priority};
