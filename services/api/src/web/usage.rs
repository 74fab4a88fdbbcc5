//! services/api/src/web/usage.rs
//!
//! The usage meter endpoint and the rate-limit headers shared by the AI proxy.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use documind_core::domain::{Identity, UsageSnapshot};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;

pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// Unix epoch milliseconds.
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub fn rate_limit_headers(usage: &UsageSnapshot) -> [(HeaderName, HeaderValue); 3] {
    [
        (LIMIT_HEADER, HeaderValue::from(usage.limit)),
        (REMAINING_HEADER, HeaderValue::from(usage.remaining)),
        (RESET_HEADER, HeaderValue::from(usage.reset_at.timestamp_millis())),
    ]
}

/// The daily-credits meter.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    /// Share of the allowance already spent, 0–100.
    pub percent_used: u32,
    pub reset_at: DateTime<Utc>,
}

impl From<UsageSnapshot> for UsageResponse {
    fn from(usage: UsageSnapshot) -> Self {
        let percent_used = if usage.limit == 0 {
            100
        } else {
            usage.used() * 100 / usage.limit
        };
        Self {
            limit: usage.limit,
            remaining: usage.remaining,
            used: usage.used(),
            percent_used,
            reset_at: usage.reset_at,
        }
    }
}

/// Read the caller's remaining daily allowance without consuming any of it.
#[utoipa::path(
    get,
    path = "/usage",
    responses(
        (status = 200, description = "Current allowance", body = UsageResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn usage_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UsageResponse>, ApiError> {
    let usage = app_state.usage.remaining(&identity.user_id).await?;
    Ok(Json(usage.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn meter_percentages() {
        let reset_at = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let meter = UsageResponse::from(UsageSnapshot {
            limit: 3,
            remaining: 1,
            reset_at,
        });
        assert_eq!(meter.used, 2);
        assert_eq!(meter.percent_used, 66);

        let headers = rate_limit_headers(&UsageSnapshot {
            limit: 3,
            remaining: 0,
            reset_at,
        });
        assert_eq!(headers[1].1, "0");
        assert_eq!(headers[2].1, reset_at.timestamp_millis().to_string().as_str());
    }
}
