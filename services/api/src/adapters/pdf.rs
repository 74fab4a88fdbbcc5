//! services/api/src/adapters/pdf.rs
//!
//! PDF text extraction backed by the `pdf-extract` crate.
//! Implements the `TextExtractionService` port from the `core` crate.

use async_trait::async_trait;
use documind_core::ports::{PortError, PortResult, TextExtractionService};
use tracing::warn;

/// Every PDF file starts with this marker.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

pub fn looks_like_pdf(payload: &[u8]) -> bool {
    payload.starts_with(PDF_SIGNATURE)
}

/// A PDF extractor that implements `TextExtractionService`.
#[derive(Clone, Default)]
pub struct PdfExtractAdapter;

impl PdfExtractAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractionService for PdfExtractAdapter {
    /// Parses the payload on the blocking pool. The buffer is owned by the
    /// blocking task and dropped when it finishes, whether parsing succeeds,
    /// fails or panics.
    async fn extract_text(&self, payload: Vec<u8>) -> PortResult<String> {
        let size = payload.len();
        let parsed = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&payload).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| {
            warn!(size, error = %e, "PDF extraction task aborted");
            PortError::Upstream(format!("PDF extraction aborted: {}", e))
        })?;

        parsed.map_err(|e| {
            warn!(size, error = %e, "PDF extraction failed");
            PortError::Upstream(format!("PDF extraction failed: {}", e))
        })
    }
}
