//! Workflow engine: loads workflows, enforces step gating, seals
//! signatures and commits transitions through a compare-and-swap.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use docseal_shared::types::{ActionId, DocumentId, WorkflowId};

use crate::audit::{AuditEntry, AuditRecord};
use crate::document::{DocumentStatus, DocumentTemplate};
use crate::vault::SignatureVault;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{AdvanceRequest, Workflow, WorkflowAction};

/// Everything a successful advance writes, committed as one unit.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    /// Workflow state after the transition.
    pub workflow: Workflow,
    /// `current_step` the caller observed; the write applies only if it
    /// still holds and the workflow is not terminal.
    pub expected_step: u32,
    /// Action row to insert.
    pub action: WorkflowAction,
    /// New document status.
    pub document_status: DocumentStatus,
    /// Ledger entry to append.
    pub ledger_entry: AuditEntry,
}

/// Persistence for workflows and their actions.
pub trait WorkflowRepository: Send + Sync {
    /// Workflow by ID.
    fn find_by_id(
        &self,
        id: WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, WorkflowError>> + Send;

    /// Workflow owned by a document.
    fn find_by_document(
        &self,
        document_id: DocumentId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, WorkflowError>> + Send;

    /// Actions recorded on a workflow, oldest first.
    fn list_actions(
        &self,
        workflow_id: WorkflowId,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowAction>, WorkflowError>> + Send;

    /// Apply a transition atomically.
    ///
    /// Must return `WorkflowError::ConcurrentModification` and write
    /// nothing if `expected_step` no longer matches or the workflow became
    /// terminal.
    fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> impl std::future::Future<Output = Result<AuditRecord, WorkflowError>> + Send;
}

/// Workflow operations backed by a repository and the signature vault.
pub struct WorkflowEngine<R: WorkflowRepository> {
    repo: Arc<R>,
    vault: Arc<SignatureVault>,
}

impl<R: WorkflowRepository> WorkflowEngine<R> {
    /// Create an engine.
    #[must_use]
    pub fn new(repo: Arc<R>, vault: Arc<SignatureVault>) -> Self {
        Self { repo, vault }
    }

    /// Build the initial workflow for a document. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` for an inactive template.
    pub fn instantiate(
        &self,
        template: &DocumentTemplate,
        document_id: DocumentId,
    ) -> Result<Workflow, WorkflowError> {
        WorkflowService::instantiate(template, document_id)
    }

    /// Perform one action on a workflow.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the workflow does not exist
    /// - `AlreadyCompleted` / `AlreadyRejected` for terminal workflows
    /// - `InvalidAction` for `uploaded`
    /// - `RoleMismatch` if the actor does not hold the step's role
    /// - `SignatureSealFailed` if the signature cannot be sealed
    /// - `ConcurrentModification` if another advance committed first
    pub async fn advance(&self, request: AdvanceRequest) -> Result<WorkflowAction, WorkflowError> {
        let workflow = self.workflow(request.workflow_id).await?;
        let transition = WorkflowService::plan_advance(&workflow, &request.actor, request.action)?;

        let signature = match request.signature {
            Some(plaintext) => Some(
                Arc::clone(&self.vault)
                    .seal(plaintext)
                    .await
                    .map_err(|e| WorkflowError::SignatureSealFailed(e.to_string()))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let action = WorkflowAction {
            id: ActionId::new(),
            workflow_id: workflow.id,
            document_id: workflow.document_id,
            actor_id: request.actor.user_id,
            action: request.action,
            step: transition.from_step,
            comment: request.comment.filter(|c| !c.trim().is_empty()),
            signature,
            created_at: now,
        };

        let commit = TransitionCommit {
            workflow: WorkflowService::apply(&workflow, &transition, now),
            expected_step: transition.from_step,
            action: action.clone(),
            document_status: transition.document_status(),
            ledger_entry: AuditEntry::WorkflowAction(action.clone()),
        };

        match self.repo.commit_transition(commit).await {
            Ok(record) => {
                info!(
                    workflow_id = %workflow.id,
                    document_id = %workflow.document_id,
                    actor_id = %action.actor_id,
                    action = %action.action,
                    step = action.step,
                    outcome = ?transition.outcome,
                    ledger_sequence = record.sequence,
                    "Workflow advanced"
                );
                Ok(action)
            }
            Err(e @ WorkflowError::ConcurrentModification { .. }) => {
                warn!(
                    workflow_id = %workflow.id,
                    expected_step = transition.from_step,
                    "Lost advance race"
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Workflow by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn workflow(&self, id: WorkflowId) -> Result<Workflow, WorkflowError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound(id))
    }

    /// Workflow owned by a document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentWorkflowNotFound` if the document has none.
    pub async fn workflow_for_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Workflow, WorkflowError> {
        self.repo
            .find_by_document(document_id)
            .await?
            .ok_or(WorkflowError::DocumentWorkflowNotFound(document_id))
    }

    /// Action history of a workflow, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workflow does not exist.
    pub async fn actions(&self, workflow_id: WorkflowId) -> Result<Vec<WorkflowAction>, WorkflowError> {
        self.workflow(workflow_id).await?;
        self.repo.list_actions(workflow_id).await
    }

    /// Decrypt an action's stored signature. `None` if there is none or it
    /// fails authentication.
    pub async fn reveal_signature(&self, action: &WorkflowAction) -> Option<String> {
        let sealed = action.signature.clone()?;
        Arc::clone(&self.vault).open(sealed).await
    }
}
