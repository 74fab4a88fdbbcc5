//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use documind_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The cookie the identity provider's frontend SDK keeps the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Middleware that verifies the identity provider's session token.
///
/// If valid, inserts the caller's `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized before any handler runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers()).ok_or_else(|| {
        debug!(path = %req.uri().path(), "Request without a session token");
        ApiError::Port(PortError::Unauthorized)
    })?;

    let identity = state.identity.verify(token).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// `Authorization: Bearer` wins over the session cookie.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|t| !t.is_empty())
}
