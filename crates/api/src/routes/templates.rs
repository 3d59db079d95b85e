//! Template management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use docseal_core::document::{CreateTemplate, DocumentTemplate};
use docseal_core::workflow::Role;
use docseal_shared::types::TemplateId;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Roles allowed to define or retire templates.
const TEMPLATE_MANAGERS: [Role; 2] = [Role::Admin, Role::Registrar];

/// Creates the template routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", post(create_template).get(list_templates))
        .route("/templates/{template_id}", get(get_template))
        .route("/templates/{template_id}/deactivate", post(deactivate_template))
}

/// Request body for creating a template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    /// Display name.
    pub name: String,
    /// Document type label.
    pub document_type: String,
    /// Ordered role identifiers.
    pub approval_path: Vec<String>,
}

/// Query parameters for listing templates.
#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    /// Only active templates (default true).
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

const fn default_active_only() -> bool {
    true
}

/// POST `/templates`
async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<DocumentTemplate>), ApiError> {
    auth.require_any(&TEMPLATE_MANAGERS)?;

    let template = state
        .documents
        .create_template(CreateTemplate {
            name: payload.name,
            document_type: payload.document_type,
            approval_path: payload.approval_path,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// GET `/templates`
async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<Vec<DocumentTemplate>>, ApiError> {
    Ok(Json(state.documents.templates(query.active_only).await?))
}

/// GET `/templates/{template_id}`
async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<DocumentTemplate>, ApiError> {
    Ok(Json(state.documents.template(template_id).await?))
}

/// POST `/templates/{template_id}/deactivate`
async fn deactivate_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(template_id): Path<TemplateId>,
) -> Result<Json<DocumentTemplate>, ApiError> {
    auth.require_any(&TEMPLATE_MANAGERS)?;
    Ok(Json(state.documents.deactivate_template(template_id).await?))
}
