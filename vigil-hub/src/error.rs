//! Error types for vigil-hub
//!
//! Handlers return [`ApiResult`]; every error renders as the shared
//! `{"success": false, "error": "..."}` envelope with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use vigil_common::api::ApiResponse;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong bearer token (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// State conflict (409), e.g. an illegal status transition
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<vigil_common::Error> for ApiError {
    fn from(err: vigil_common::Error) -> Self {
        match err {
            vigil_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            vigil_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            e @ vigil_common::Error::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body: ApiResponse<()> = ApiResponse::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
