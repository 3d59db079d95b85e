//! Document registration and lookup routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use docseal_core::document::{Document, RegisterDocument};
use docseal_core::integrity::IntegrityReport;
use docseal_shared::types::{DocumentId, TemplateId};

use super::workflows::WorkflowResponse;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(register_document))
        .route("/documents/{document_id}", get(get_document))
        .route("/documents/{document_id}/integrity", get(check_integrity))
        .route("/documents/{document_id}/download", get(download_url))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Document together with its workflow.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// The document.
    pub document: Document,
    /// Its approval workflow.
    pub workflow: WorkflowResponse,
}

/// Response for a registration.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    /// The document.
    pub document: Document,
    /// Its approval workflow.
    pub workflow: WorkflowResponse,
    /// Ledger position of the registration entry.
    pub ledger_sequence: i64,
}

/// Presigned download link.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// Expiry (RFC 3339).
    pub expires_at: DateTime<Utc>,
}

/// Parsed multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    template_id: Option<TemplateId>,
    title: Option<String>,
    file: Option<(String, String, Bytes)>,
}

fn invalid_form(detail: impl std::fmt::Display) -> ApiError {
    ApiError::bad_request("INVALID_FORM", detail)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("template_id") => {
                let raw = field.text().await.map_err(invalid_form)?;
                let id = raw
                    .trim()
                    .parse::<TemplateId>()
                    .map_err(|_| invalid_form(format!("invalid template_id '{raw}'")))?;
                form.template_id = Some(id);
            }
            Some("title") => {
                form.title = Some(field.text().await.map_err(invalid_form)?);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(invalid_form)?;
                form.file = Some((filename, content_type, bytes));
            }
            _ => {}
        }
    }

    Ok(form)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/documents` (multipart: `template_id`, `title`, `file`)
async fn register_document(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let form = read_form(multipart).await?;
    let template_id = form
        .template_id
        .ok_or_else(|| invalid_form("template_id is required"))?;
    let (filename, content_type, content) =
        form.file.ok_or_else(|| invalid_form("file is required"))?;
    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| filename.clone());

    let registration = state
        .documents
        .register(RegisterDocument {
            owner_id: auth.user_id(),
            template_id,
            title,
            filename,
            content_type,
            content,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            document: registration.document,
            workflow: registration.workflow.into(),
            ledger_sequence: registration.ledger_sequence,
        }),
    ))
}

/// GET `/documents` - documents uploaded by the caller.
async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.documents.documents_for_owner(auth.user_id()).await?))
}

/// GET `/documents/{document_id}`
async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state.documents.document(document_id).await?;
    let workflow = state.workflows.workflow_for_document(document_id).await?;
    Ok(Json(DocumentResponse {
        document,
        workflow: workflow.into(),
    }))
}

/// GET `/documents/{document_id}/integrity`
async fn check_integrity(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<IntegrityReport>, ApiError> {
    Ok(Json(state.documents.verify_integrity(document_id).await?))
}

/// GET `/documents/{document_id}/download`
async fn download_url(
    State(state): State<AppState>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let document = state.documents.document(document_id).await?;
    let presigned = state.storage.presign_download(&document.storage_key).await?;
    Ok(Json(DownloadResponse {
        url: presigned.url,
        method: presigned.method,
        expires_at: presigned.expires_at,
    }))
}
