pub mod completion;
pub mod dashboard;
pub mod documents;
pub mod middleware;
pub mod rest;
pub mod revalidate;
pub mod state;
pub mod usage;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::error::ApiError;

pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the full application: public routes, session-protected routes and
/// the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(rest::health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route("/account", delete(dashboard::delete_account_handler))
        .route("/usage", get(usage::usage_handler))
        .route(
            "/documents",
            get(documents::list_documents_handler).post(documents::create_document_handler),
        )
        .route("/documents/upload", post(documents::upload_document_handler))
        .route(
            "/documents/{id}",
            get(documents::get_document_handler)
                .patch(documents::update_document_handler)
                .delete(documents::delete_document_handler),
        )
        .route(
            "/documents/{id}/generations",
            get(documents::list_generations_handler),
        )
        .route("/documents/{id}/ai", post(completion::document_ai_handler))
        .route("/api/completion", post(completion::completion_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Browser access for the configured frontend origin, cookies included.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, ApiError> {
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}
