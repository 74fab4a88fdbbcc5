//! services/api/src/web/completion.rs
//!
//! The AI proxy. A request is authenticated (middleware), ownership-checked,
//! charged one unit of daily allowance, then relayed to the generation
//! endpoint. Text is streamed back as it arrives; once the upstream stream
//! ends cleanly the assembled output is saved against the target document.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use bytes::Bytes;
use documind_core::{
    domain::Identity,
    ports::{DatabaseService, PortError, TextStream},
    prompt::{compose_prompt, AiCommand},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::{io, sync::Arc};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::revalidate::Revalidate;
use crate::web::state::AppState;
use crate::web::usage::rate_limit_headers;

const STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletionRequest {
    pub prompt: String,
    /// When set, the output is saved as a generation of this document.
    pub document_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AiCommandKind {
    Summarize,
    Professional,
    Custom,
}

impl From<AiCommandKind> for AiCommand {
    fn from(kind: AiCommandKind) -> Self {
        match kind {
            AiCommandKind::Summarize => AiCommand::Summarize,
            AiCommandKind::Professional => AiCommand::Professional,
            AiCommandKind::Custom => AiCommand::Custom,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentAiRequest {
    pub command: AiCommandKind,
    /// Required for `custom`, ignored otherwise.
    pub instruction: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Stream a completion for a free-form prompt.
#[utoipa::path(
    post,
    path = "/api/completion",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Streamed plain-text completion", content_type = "text/plain"),
        (status = 400, description = "Empty prompt"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Target document not found"),
        (status = 429, description = "Daily allowance exhausted"),
        (status = 502, description = "Generation endpoint failed")
    )
)]
pub async fn completion_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Response, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::validation("Prompt is required"));
    }
    if let Some(document_id) = payload.document_id {
        app_state
            .db
            .get_owned_document(&identity.user_id, document_id)
            .await?;
    }

    stream_generation(&app_state, &identity, payload.document_id, payload.prompt).await
}

/// Run one of the editor's rewrite commands over a document's content.
#[utoipa::path(
    post,
    path = "/documents/{id}/ai",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = DocumentAiRequest,
    responses(
        (status = 200, description = "Streamed plain-text completion", content_type = "text/plain"),
        (status = 400, description = "Custom command without an instruction"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Document not found"),
        (status = 429, description = "Daily allowance exhausted"),
        (status = 502, description = "Generation endpoint failed")
    )
)]
pub async fn document_ai_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<DocumentAiRequest>,
) -> Result<Response, ApiError> {
    let command = AiCommand::from(payload.command);
    let instruction = command.instruction(payload.instruction.as_deref())?;

    let document = app_state
        .db
        .get_owned_document(&identity.user_id, document_id)
        .await?;
    let prompt = compose_prompt(&document.content, instruction);

    stream_generation(&app_state, &identity, Some(document.id), prompt).await
}

//=========================================================================================
// Proxy Pipeline
//=========================================================================================

async fn stream_generation(
    app_state: &AppState,
    identity: &Identity,
    target: Option<Uuid>,
    prompt: String,
) -> Result<Response, ApiError> {
    let decision = app_state.usage.consume(&identity.user_id).await?;
    if !decision.allowed {
        warn!(
            user_id = %identity.user_id,
            reset_at = %decision.usage.reset_at,
            "Daily generation limit reached"
        );
        return Err(PortError::QuotaExceeded(decision.usage).into());
    }

    let upstream = app_state.generator.stream_completion(&prompt).await?;
    info!(
        user_id = %identity.user_id,
        document_id = ?target,
        remaining = decision.usage.remaining,
        "Streaming completion"
    );

    let body = relay_and_persist(
        app_state.db.clone(),
        identity.user_id.clone(),
        target,
        prompt,
        upstream,
    );

    Ok((
        [(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)],
        rate_limit_headers(&decision.usage),
        target.map(Revalidate::document),
        Body::from_stream(body),
    )
        .into_response())
}

/// Forwards each fragment as soon as it arrives and keeps a copy. The copy is
/// saved only if the upstream stream ends without error; a dropped body (client
/// gone) never reaches the save.
fn relay_and_persist(
    db: Arc<dyn DatabaseService>,
    owner: String,
    target: Option<Uuid>,
    prompt: String,
    mut upstream: TextStream,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    async_stream::stream! {
        let mut output = String::new();
        let mut failed = false;

        while let Some(fragment) = upstream.next().await {
            match fragment {
                Ok(text) => {
                    output.push_str(&text);
                    yield Ok::<Bytes, io::Error>(Bytes::from(text));
                }
                Err(e) => {
                    warn!(
                        user_id = %owner,
                        error = %e,
                        bytes_sent = output.len(),
                        "Generation stream failed"
                    );
                    failed = true;
                    yield Err(io::Error::other(e.to_string()));
                    break;
                }
            }
        }

        if let (false, Some(document_id)) = (failed, target) {
            match db.create_generation(&owner, document_id, &prompt, &output).await {
                Ok(generation) => {
                    info!(%document_id, generation_id = %generation.id, "Saved generation")
                }
                Err(e) => warn!(%document_id, error = %e, "Could not save generation"),
            }
        }
    }
}
