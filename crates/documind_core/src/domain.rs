//! crates/documind_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ports::PortError;

/// Stored in place of an email when the identity provider supplies none.
pub const MISSING_EMAIL_SENTINEL: &str = "no-email";

/// Content stored for an uploaded PDF whose extraction yields no text.
pub const EMPTY_PDF_FALLBACK: &str = "No text found in PDF.";

/// Title used when an upload arrives without a file name.
pub const UNTITLED_UPLOAD: &str = "untitled.pdf";

/// A verified caller, as vouched for by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    /// The email written to a freshly provisioned account.
    pub fn email_or_sentinel(&self) -> &str {
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(MISSING_EMAIL_SENTINEL)
    }
}

/// A registered user, keyed by the identity provider's stable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub is_pro: bool,
    pub created_at: DateTime<Utc>,
}

/// The result of lazy provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub account: Account,
    /// `true` only for the visit that inserted the row.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Draft,
    Final,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Final => "final",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "final" => Ok(DocumentStatus::Final),
            other => Err(PortError::Validation(format!(
                "Unknown document status '{}'",
                other
            ))),
        }
    }
}

/// A user-owned unit of text content that can be AI-processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated request to insert a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    title: String,
    content: String,
}

impl NewDocument {
    /// Blank creation: the title must contain something other than whitespace.
    pub fn blank(title: &str, content: Option<&str>) -> Result<Self, PortError> {
        Ok(Self {
            title: validate_title(title)?,
            content: content.unwrap_or_default().to_string(),
        })
    }

    /// Upload creation from the text the extraction service produced.
    pub fn from_extracted(file_name: Option<&str>, extracted: &str) -> Self {
        let title = file_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNTITLED_UPLOAD)
            .to_string();
        let text = extracted.trim();
        let content = if text.is_empty() {
            EMPTY_PDF_FALLBACK.to_string()
        } else {
            text.to_string()
        };
        Self { title, content }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A validated partial update of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<DocumentStatus>,
}

impl DocumentPatch {
    pub fn new(
        title: Option<&str>,
        content: Option<&str>,
        status: Option<DocumentStatus>,
    ) -> Result<Self, PortError> {
        if title.is_none() && content.is_none() && status.is_none() {
            return Err(PortError::Validation("Nothing to update".to_string()));
        }
        Ok(Self {
            title: title.map(validate_title).transpose()?,
            content: content.map(str::to_string),
            status,
        })
    }
}

/// One persisted AI invocation result tied to a document. Never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub id: Uuid,
    pub document_id: Uuid,
    pub original_prompt: String,
    pub ai_output: String,
    pub created_at: DateTime<Utc>,
}

/// A point-in-time view of a user's sliding-window allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub limit: u32,
    pub remaining: u32,
    /// When the oldest counted unit leaves the window.
    pub reset_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn used(&self) -> u32 {
        self.limit.saturating_sub(self.remaining)
    }
}

/// The outcome of trying to consume one unit of allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub usage: UsageSnapshot,
}

fn validate_title(title: &str) -> Result<String, PortError> {
    if title.trim().is_empty() {
        return Err(PortError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_title_is_rejected() {
        let err = NewDocument::blank("   ", Some("body")).unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[test]
    fn title_is_stored_as_submitted() {
        let doc = NewDocument::blank("  Q3 plan ", Some("Grow revenue.")).unwrap();
        assert_eq!(doc.title(), "  Q3 plan ");
        assert_eq!(doc.content(), "Grow revenue.");

        let patch = DocumentPatch::new(Some(" Renamed "), None, None).unwrap();
        assert_eq!(patch.title.as_deref(), Some(" Renamed "));
    }

    #[test]
    fn blank_document_keeps_content_and_defaults_to_empty() {
        let doc = NewDocument::blank("Plan", Some("Q3 goals")).unwrap();
        assert_eq!(doc.title(), "Plan");
        assert_eq!(doc.content(), "Q3 goals");

        let doc = NewDocument::blank("Plan", None).unwrap();
        assert_eq!(doc.content(), "");
    }

    #[test]
    fn extracted_text_falls_back_when_empty() {
        let doc = NewDocument::from_extracted(Some("scan.pdf"), " \n\x0C ");
        assert_eq!(doc.title(), "scan.pdf");
        assert_eq!(doc.content(), EMPTY_PDF_FALLBACK);

        let doc = NewDocument::from_extracted(None, "Hello");
        assert_eq!(doc.title(), UNTITLED_UPLOAD);
        assert_eq!(doc.content(), "Hello");
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(DocumentPatch::new(None, None, None).is_err());
        assert!(DocumentPatch::new(Some(" "), None, None).is_err());
        let patch = DocumentPatch::new(None, None, Some(DocumentStatus::Final)).unwrap();
        assert_eq!(patch.status, Some(DocumentStatus::Final));
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("final".parse::<DocumentStatus>().unwrap(), DocumentStatus::Final);
        assert_eq!(DocumentStatus::default().as_str(), "draft");
        assert!("archived".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn identity_without_email_uses_sentinel() {
        let id = Identity {
            user_id: "user_1".into(),
            email: None,
        };
        assert_eq!(id.email_or_sentinel(), MISSING_EMAIL_SENTINEL);
    }
}
