//! services/api/src/web/dashboard.rs
//!
//! The landing view and account lifecycle.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use documind_core::domain::{Account, Identity};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::documents::DocumentResponse;
use crate::web::revalidate::Revalidate;
use crate::web::state::AppState;
use crate::web::usage::UsageResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub is_pro: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            is_pro: account.is_pro,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub account: AccountResponse,
    pub documents: Vec<DocumentResponse>,
    pub usage: UsageResponse,
}

/// Load the dashboard, provisioning the account on first visit.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Account, documents and usage meter", body = DashboardResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let provisioned = app_state.db.ensure_account(&identity).await?;
    if provisioned.created {
        info!(user_id = %identity.user_id, "Synced new user");
    }

    let documents = app_state.db.list_documents(&identity.user_id).await?;
    let usage = app_state.usage.remaining(&identity.user_id).await?;

    Ok(Json(DashboardResponse {
        account: provisioned.account.into(),
        documents: documents.into_iter().map(Into::into).collect(),
        usage: usage.into(),
    }))
}

/// Delete the caller's account together with its documents and generations.
#[utoipa::path(
    delete,
    path = "/account",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No account for this session")
    )
)]
pub async fn delete_account_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.db.delete_account(&identity.user_id).await?;
    info!(user_id = %identity.user_id, "Deleted account");

    Ok((StatusCode::NO_CONTENT, Revalidate::dashboard(), ()))
}
