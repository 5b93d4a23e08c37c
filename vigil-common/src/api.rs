//! Shared API response envelope
//!
//! Every hub endpoint (except `/health`) answers with
//! `{"success": bool, "data": ..., "error": "..."}`. Clients treat anything
//! other than `success == true` with data present as a failure.

use serde::{Deserialize, Serialize};

/// JSON response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The payload, only when the server reported success
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response reported success without data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "server reported failure".to_string())),
        }
    }
}

/// Health check body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}
