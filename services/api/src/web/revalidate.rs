//! services/api/src/web/revalidate.rs
//!
//! The UI-refresh signal. Mutating responses name the views they made stale;
//! the client re-fetches those before its next render.

use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use std::convert::Infallible;
use uuid::Uuid;

pub const REVALIDATE_HEADER: HeaderName = HeaderName::from_static("x-revalidate");

pub const DASHBOARD_VIEW: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revalidate(Vec<String>);

impl Revalidate {
    /// The document list changed.
    pub fn dashboard() -> Self {
        Self(vec![DASHBOARD_VIEW.to_string()])
    }

    /// One document changed; the list shows it too.
    pub fn document(id: Uuid) -> Self {
        Self(vec![DASHBOARD_VIEW.to_string(), format!("/documents/{}", id)])
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }
}

impl IntoResponseParts for Revalidate {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        // Paths are built from static text and UUIDs, always valid header bytes.
        if let Ok(value) = HeaderValue::from_str(&self.0.join(", ")) {
            res.headers_mut().insert(REVALIDATE_HEADER, value);
        }
        Ok(res)
    }
}
