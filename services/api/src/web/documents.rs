//! services/api/src/web/documents.rs
//!
//! Handlers for document ingestion and management. Every route here sits
//! behind `require_auth`, and every lookup goes through the owner-scoped
//! store methods.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use documind_core::domain::{
    Document, DocumentPatch, DocumentStatus, Generation, Identity, NewDocument,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::pdf::looks_like_pdf;
use crate::error::ApiError;
use crate::web::revalidate::Revalidate;
use crate::web::state::AppState;

/// Name of the multipart part carrying the PDF.
pub const UPLOAD_FIELD: &str = "file";

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// `draft` or `final`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            content: doc.content,
            status: doc.status.as_str().to_string(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub original_prompt: String,
    pub ai_output: String,
    pub created_at: DateTime<Utc>,
}

impl From<Generation> for GenerationResponse {
    fn from(generation: Generation) -> Self {
        Self {
            id: generation.id,
            document_id: generation.document_id,
            original_prompt: generation.original_prompt,
            ai_output: generation.ai_output,
            created_at: generation.created_at,
        }
    }
}

/// The editor view: a document and the output shown in its AI pane.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentDetailResponse {
    pub document: DocumentResponse,
    pub latest_generation: Option<GenerationResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a blank document.
#[utoipa::path(
    post,
    path = "/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Title missing or blank"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn create_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_doc = NewDocument::blank(
        payload.title.as_deref().unwrap_or_default(),
        payload.content.as_deref(),
    )?;

    app_state.db.ensure_account(&identity).await?;
    let document = app_state
        .db
        .create_document(&identity.user_id, &new_doc)
        .await?;
    info!(user_id = %identity.user_id, document_id = %document.id, "Created blank document");

    Ok((
        StatusCode::CREATED,
        Revalidate::dashboard(),
        Json(DocumentResponse::from(document)),
    ))
}

/// Create a document from an uploaded PDF.
///
/// Accepts a multipart/form-data request with a single `file` part.
#[utoipa::path(
    post,
    path = "/documents/upload",
    request_body(content_type = "multipart/form-data", description = "The PDF to import."),
    responses(
        (status = 201, description = "Document created from the PDF", body = DocumentResponse),
        (status = 400, description = "Missing, empty or non-PDF file"),
        (status = 401, description = "No valid session"),
        (status = 413, description = "Upload exceeds the size ceiling"),
        (status = 502, description = "Text extraction failed")
    )
)]
pub async fn upload_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping unexpected multipart field");
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let payload = field.bytes().await?;
        upload = Some((file_name, payload));
        break;
    }

    let (file_name, payload) = upload
        .filter(|(_, payload)| !payload.is_empty())
        .ok_or_else(|| ApiError::validation("No file uploaded"))?;
    if !looks_like_pdf(&payload) {
        return Err(ApiError::validation("Only PDF files are supported"));
    }

    let size = payload.len();
    let extracted = app_state.extractor.extract_text(Vec::from(payload)).await?;
    let new_doc = NewDocument::from_extracted(file_name.as_deref(), &extracted);

    app_state.db.ensure_account(&identity).await?;
    let document = app_state
        .db
        .create_document(&identity.user_id, &new_doc)
        .await?;
    info!(
        user_id = %identity.user_id,
        document_id = %document.id,
        bytes = size,
        "Imported PDF"
    );

    Ok((
        StatusCode::CREATED,
        Revalidate::dashboard(),
        Json(DocumentResponse::from(document)),
    ))
}

/// List the caller's documents, most recent first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentResponse]),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let documents = app_state.db.list_documents(&identity.user_id).await?;
    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

/// Open a document in the editor.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document and its latest AI output", body = DocumentDetailResponse),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentDetailResponse>, ApiError> {
    let document = app_state
        .db
        .get_owned_document(&identity.user_id, document_id)
        .await?;
    let latest_generation = app_state
        .db
        .list_generations(&identity.user_id, document_id)
        .await?
        .into_iter()
        .next()
        .map(Into::into);

    Ok(Json(DocumentDetailResponse {
        document: document.into(),
        latest_generation,
    }))
}

/// Edit a document's title, content or status.
#[utoipa::path(
    patch,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "Empty patch, blank title or unknown status"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn update_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = payload
        .status
        .as_deref()
        .map(str::parse::<DocumentStatus>)
        .transpose()?;
    let patch = DocumentPatch::new(payload.title.as_deref(), payload.content.as_deref(), status)?;

    let document = app_state
        .db
        .update_owned_document(&identity.user_id, document_id, &patch)
        .await?;

    Ok((
        Revalidate::document(document.id),
        Json(DocumentResponse::from(document)),
    ))
}

/// Delete a document and its generations.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .db
        .delete_owned_document(&identity.user_id, document_id)
        .await?;
    info!(user_id = %identity.user_id, %document_id, "Deleted document");

    Ok((StatusCode::NO_CONTENT, Revalidate::document(document_id), ()))
}

/// The AI outputs saved for a document, most recent first.
#[utoipa::path(
    get,
    path = "/documents/{id}/generations",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Saved AI outputs", body = [GenerationResponse]),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn list_generations_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<GenerationResponse>>, ApiError> {
    // An unowned document has no visible generations; report it as missing.
    app_state
        .db
        .get_owned_document(&identity.user_id, document_id)
        .await?;
    let generations = app_state
        .db
        .list_generations(&identity.user_id, document_id)
        .await?;
    Ok(Json(generations.into_iter().map(Into::into).collect()))
}
