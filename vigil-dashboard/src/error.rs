//! Error types for vigil-dashboard

use thiserror::Error;

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot request failed at the transport level or returned bad JSON
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Push-channel handshake or framing error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server answered without `success: true`
    #[error("Snapshot unavailable: {0}")]
    Snapshot(String),

    /// Server URL cannot be turned into an HTTP or WebSocket endpoint
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Stored bearer token cannot be sent as a header
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Local key-value storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The view was unmounted; commands are no longer accepted
    #[error("View is unmounted")]
    Unmounted,

    #[error(transparent)]
    Common(#[from] vigil_common::Error),
}
