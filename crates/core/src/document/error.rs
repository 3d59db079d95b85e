//! Document error types.

use thiserror::Error;

use docseal_shared::types::{DocumentId, TemplateId};

use crate::integrity::Fingerprint;
use crate::storage::StorageError;
use crate::workflow::WorkflowError;

/// Errors that can occur while registering or reading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document does not exist.
    #[error("Document {0} not found")]
    NotFound(DocumentId),

    /// Template does not exist.
    #[error("Template {0} not found")]
    TemplateNotFound(TemplateId),

    /// A document with the same content is already registered.
    #[error("A document with fingerprint {fingerprint} is already registered")]
    HashCollision {
        /// The colliding fingerprint.
        fingerprint: Fingerprint,
    },

    /// Upload had no bytes.
    #[error("Document content is empty")]
    EmptyContent,

    /// Template input was rejected.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Object storage failed or rejected the upload.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Persistence failure.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl DocumentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::TemplateNotFound(_) => 404,
            Self::HashCollision { .. } => 409,
            Self::EmptyContent => 400,
            Self::Workflow(e) => e.status_code(),
            Self::Storage(e) => e.status_code(),
            Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::HashCollision { .. } => "HASH_COLLISION",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::Workflow(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Repository(_) => "INTERNAL_ERROR",
        }
    }
}
