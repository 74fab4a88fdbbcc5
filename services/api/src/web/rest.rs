//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the unauthenticated
//! liveness check.

use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::{completion, dashboard, documents, usage};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        dashboard::dashboard_handler,
        dashboard::delete_account_handler,
        usage::usage_handler,
        documents::create_document_handler,
        documents::upload_document_handler,
        documents::list_documents_handler,
        documents::get_document_handler,
        documents::update_document_handler,
        documents::delete_document_handler,
        documents::list_generations_handler,
        completion::completion_handler,
        completion::document_ai_handler,
    ),
    components(
        schemas(
            HealthResponse,
            dashboard::AccountResponse,
            dashboard::DashboardResponse,
            usage::UsageResponse,
            documents::DocumentResponse,
            documents::GenerationResponse,
            documents::DocumentDetailResponse,
            documents::CreateDocumentRequest,
            documents::UpdateDocumentRequest,
            completion::CompletionRequest,
            completion::AiCommandKind,
            completion::DocumentAiRequest,
        )
    ),
    modifiers(&SessionAuth),
    security(("session" = [])),
    tags(
        (name = "DocuMind API", description = "Documents, AI rewrites and daily usage for the writing workspace.")
    )
)]
pub struct ApiDoc;

/// Registers the identity provider's bearer token as the security scheme.
struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    security(()),
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
