//! Bearer-token authentication for staff routes
//!
//! Citizens submit reports and watch the push channel without credentials.
//! Police/admin tooling sends `Authorization: Bearer <token>`; the token is
//! compared against the configured staff token.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Token from an `Authorization: Bearer ...` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Whether the request carries the staff token
pub fn is_staff(state: &AppState, headers: &HeaderMap) -> bool {
    match (&state.api_token, bearer_token(headers)) {
        (Some(expected), Some(provided)) => expected == provided,
        _ => false,
    }
}

/// Staff-only middleware
///
/// With no staff token configured every staff route answers 401.
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_staff(&state, request.headers()) {
        warn!(
            "Rejected unauthenticated request to {} {}",
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
