//! Workflow error types for document approval routing.

use thiserror::Error;

use docseal_shared::types::{DocumentId, WorkflowId};

use crate::workflow::types::{Role, WorkflowActionKind};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Workflow does not exist.
    #[error("Workflow {0} not found")]
    NotFound(WorkflowId),

    /// No workflow is attached to the document.
    #[error("No workflow found for document {0}")]
    DocumentWorkflowNotFound(DocumentId),

    /// Actor's role is not the one required at the current step.
    #[error("Step requires role {required}, actor has role {actual}")]
    RoleMismatch {
        /// Role required at the current step.
        required: Role,
        /// Role the actor presented.
        actual: Role,
    },

    /// Workflow already completed every step.
    #[error("Workflow is already completed")]
    AlreadyCompleted,

    /// Workflow was rejected.
    #[error("Workflow is already rejected")]
    AlreadyRejected,

    /// Another advance committed first.
    #[error("Workflow {workflow_id} moved past step {expected_step}; retry")]
    ConcurrentModification {
        /// Workflow that was contended.
        workflow_id: WorkflowId,
        /// Step the losing caller expected.
        expected_step: u32,
    },

    /// Template or approval path cannot produce a workflow.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Action kind cannot be used to advance.
    #[error("Action '{0}' cannot advance a workflow")]
    InvalidAction(WorkflowActionKind),

    /// Signature payload could not be sealed.
    #[error("Signature could not be sealed: {0}")]
    SignatureSealFailed(String),

    /// Persistence failure.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl WorkflowError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTemplate(_) | Self::InvalidAction(_) => 400,
            Self::RoleMismatch { .. } => 403,
            Self::NotFound(_) | Self::DocumentWorkflowNotFound(_) => 404,
            Self::AlreadyCompleted
            | Self::AlreadyRejected
            | Self::ConcurrentModification { .. } => 409,
            Self::SignatureSealFailed(_) | Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::DocumentWorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            Self::RoleMismatch { .. } => "ROLE_MISMATCH",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::AlreadyRejected => "ALREADY_REJECTED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::InvalidTemplate(_) => "INVALID_TEMPLATE",
            Self::InvalidAction(_) => "INVALID_ACTION",
            Self::SignatureSealFailed(_) | Self::Repository(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}
