//! Common error types for Vigil

use thiserror::Error;

/// Common result type for Vigil operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the hub and the dashboard
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Report status change not allowed from the current status
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}
