//! API error responses.
//!
//! Every domain error carries its own status and code; this module turns
//! them into `{"error", "message"}` bodies. Server-side failures are logged
//! in full and answered with an opaque message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use docseal_core::audit::AuditError;
use docseal_core::document::DocumentError;
use docseal_core::storage::StorageError;
use docseal_core::verification::VerificationError;
use docseal_core::workflow::WorkflowError;
use docseal_shared::AppError;

const OPAQUE_MESSAGE: &str = "An internal error occurred";

/// Error body returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Set when retrying the same request may succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

/// Error returned by handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Build an error from a status, code and detail.
    ///
    /// For 5xx statuses the detail is logged and replaced with an opaque
    /// message.
    pub fn new(status: u16, code: &'static str, detail: impl std::fmt::Display) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if status.is_server_error() {
            error!(code, error = %detail, "Request failed");
            OPAQUE_MESSAGE.to_string()
        } else {
            detail.to_string()
        };
        Self {
            status,
            body: ErrorBody {
                error: code,
                message,
                retryable: false,
            },
        }
    }

    /// 400 with the given code.
    pub fn bad_request(code: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::new(400, code, detail)
    }

    /// 401 with the given code.
    pub fn unauthorized(code: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::new(401, code, detail)
    }

    /// 403 with the given code.
    pub fn forbidden(code: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::new(403, code, detail)
    }

    /// 404 with the given code.
    pub fn not_found(code: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::new(404, code, detail)
    }

    #[must_use]
    fn retryable(mut self, retryable: bool) -> Self {
        self.body.retryable = retryable;
        self
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        Self::new(e.status_code(), e.error_code(), &e).retryable(e.is_retryable())
    }
}

impl From<DocumentError> for ApiError {
    fn from(e: DocumentError) -> Self {
        let retryable = matches!(&e, DocumentError::Workflow(w) if w.is_retryable());
        Self::new(e.status_code(), e.error_code(), &e).retryable(retryable)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::new(e.status_code(), e.error_code(), &e)
    }
}

impl From<AuditError> for ApiError {
    fn from(e: AuditError) -> Self {
        Self::new(e.status_code(), e.error_code(), &e)
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        Self::new(e.status_code(), e.error_code(), &e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::new(e.status_code(), e.error_code(), &e)
    }
}
