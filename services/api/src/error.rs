//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! failure is rendered as an HTTP response.

use crate::config::ConfigError;
use crate::web::usage::rate_limit_headers;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use documind_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from the usage counter connection.
    #[error("Redis Error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A malformed or oversized multipart upload.
    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Port(PortError::Validation(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Port(PortError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            ApiError::Port(PortError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Not found".to_string(),
            ),
            ApiError::Port(PortError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "validation_failed", msg.clone())
            }
            ApiError::Port(PortError::QuotaExceeded(usage)) => {
                let message = PortError::QuotaExceeded(*usage).to_string();
                let body = Json(json!({
                    "error": { "code": "quota_exceeded", "message": message }
                }));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    rate_limit_headers(usage),
                    body,
                )
                    .into_response();
            }
            ApiError::Port(PortError::Upstream(detail)) => {
                error!(error = %detail, "Upstream service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_failure",
                    "An upstream service failed. Please try again.".to_string(),
                )
            }
            ApiError::Multipart(e) => (e.status(), "invalid_upload", e.body_text()),
            other => {
                error!(error = %other, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": { "code": code, "message": message }
        }));
        (status, body).into_response()
    }
}
