//! crates/documind_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the identity provider, the store, the usage counter,
//! the PDF extractor and the LLM endpoint.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{
    Document, DocumentPatch, Generation, Identity, NewDocument, Provisioned, QuotaDecision,
    UsageSnapshot,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Absent or not owned by the caller; the two are never distinguished.
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("You have reached your daily limit of {} generations", .0.limit)]
    QuotaExceeded(UsageSnapshot),
    #[error("Upstream service failed: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Text fragments as they arrive from the generation endpoint.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Accounts ---
    /// Insert-if-absent keyed on the identity's user id, then read back.
    async fn ensure_account(&self, identity: &Identity) -> PortResult<Provisioned>;

    /// Removes the account; its documents and their generations go with it.
    async fn delete_account(&self, user_id: &str) -> PortResult<()>;

    // --- Documents ---
    async fn create_document(&self, owner: &str, document: &NewDocument) -> PortResult<Document>;

    async fn list_documents(&self, owner: &str) -> PortResult<Vec<Document>>;

    async fn get_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<Document>;

    async fn update_owned_document(
        &self,
        owner: &str,
        document_id: Uuid,
        patch: &DocumentPatch,
    ) -> PortResult<Document>;

    async fn delete_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<()>;

    // --- Generations ---
    async fn create_generation(
        &self,
        owner: &str,
        document_id: Uuid,
        original_prompt: &str,
        ai_output: &str,
    ) -> PortResult<Generation>;

    /// Most recent first.
    async fn list_generations(&self, owner: &str, document_id: Uuid)
        -> PortResult<Vec<Generation>>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validates a session token issued by the identity provider.
    async fn verify(&self, token: &str) -> PortResult<Identity>;
}

#[async_trait]
pub trait UsageLimiter: Send + Sync {
    /// Consumes one unit if the window has room.
    async fn consume(&self, key: &str) -> PortResult<QuotaDecision>;

    /// Reports the allowance without consuming any of it.
    async fn remaining(&self, key: &str) -> PortResult<UsageSnapshot>;
}

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Converts a binary PDF payload into plain text.
    async fn extract_text(&self, payload: Vec<u8>) -> PortResult<String>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Streams the model's answer to a single prompt.
    async fn stream_completion(&self, prompt: &str) -> PortResult<TextStream>;
}
