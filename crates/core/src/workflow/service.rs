//! Workflow service for step-gated state transitions.
//!
//! Pure state machine: decides whether an actor may act on a workflow and
//! what the workflow looks like afterwards. Persistence and signature
//! sealing live in [`crate::workflow::engine`].

use chrono::{DateTime, Utc};

use docseal_shared::types::{DocumentId, WorkflowId};

use crate::document::{DocumentStatus, DocumentTemplate};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Actor, Workflow, WorkflowActionKind, WorkflowState};

/// Result of a permitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Moved to the next step, more steps remain.
    Advanced,
    /// Final step taken.
    Completed,
    /// Rejected; step counter unchanged.
    Rejected,
}

/// Planned transition for one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Step the action is taken at.
    pub from_step: u32,
    /// Step after the action.
    pub to_step: u32,
    /// Resulting outcome.
    pub outcome: TransitionOutcome,
}

impl Transition {
    /// Document status after this transition.
    #[must_use]
    pub const fn document_status(&self) -> DocumentStatus {
        match self.outcome {
            TransitionOutcome::Advanced => DocumentStatus::InReview,
            TransitionOutcome::Completed => DocumentStatus::Completed,
            TransitionOutcome::Rejected => DocumentStatus::Rejected,
        }
    }
}

/// Stateless service for workflow transitions.
///
/// All methods are associated functions, mirroring how the rest of the
/// domain layer keeps rules independent from storage.
pub struct WorkflowService;

impl WorkflowService {
    /// Create a workflow for a document from a template.
    ///
    /// The template's approval path is copied into `step_roles`; later
    /// template edits never affect the workflow.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTemplate` if the template is inactive.
    pub fn instantiate(
        template: &DocumentTemplate,
        document_id: DocumentId,
    ) -> Result<Workflow, WorkflowError> {
        if !template.is_active {
            return Err(WorkflowError::InvalidTemplate(format!(
                "template '{}' is inactive",
                template.name
            )));
        }

        let now = Utc::now();
        Ok(Workflow {
            id: WorkflowId::new(),
            document_id,
            step_roles: template.approval_path.clone(),
            current_step: 0,
            is_completed: false,
            is_rejected: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decide whether `actor` may perform `action` on `workflow`.
    ///
    /// Checks run in order: terminal state, action kind, role.
    ///
    /// # Errors
    ///
    /// - `AlreadyRejected` / `AlreadyCompleted` for terminal workflows
    /// - `InvalidAction` for `uploaded`
    /// - `RoleMismatch` if the actor's role is not the step's role
    pub fn plan_advance(
        workflow: &Workflow,
        actor: &Actor,
        action: WorkflowActionKind,
    ) -> Result<Transition, WorkflowError> {
        let step = match workflow.state() {
            WorkflowState::Rejected => return Err(WorkflowError::AlreadyRejected),
            WorkflowState::Completed => return Err(WorkflowError::AlreadyCompleted),
            WorkflowState::Open { step } => step,
        };

        if action == WorkflowActionKind::Uploaded {
            return Err(WorkflowError::InvalidAction(action));
        }

        let required = workflow.step_roles.role_at(step).ok_or_else(|| {
            WorkflowError::repository(format!(
                "workflow {} is open at step {step} but has {} steps",
                workflow.id,
                workflow.total_steps()
            ))
        })?;

        if actor.role != required {
            return Err(WorkflowError::RoleMismatch {
                required,
                actual: actor.role,
            });
        }

        if action == WorkflowActionKind::Rejected {
            return Ok(Transition {
                from_step: step,
                to_step: step,
                outcome: TransitionOutcome::Rejected,
            });
        }

        let to_step = step + 1;
        let outcome = if to_step == workflow.total_steps() {
            TransitionOutcome::Completed
        } else {
            TransitionOutcome::Advanced
        };

        Ok(Transition {
            from_step: step,
            to_step,
            outcome,
        })
    }

    /// Workflow state after applying a planned transition.
    #[must_use]
    pub fn apply(workflow: &Workflow, transition: &Transition, at: DateTime<Utc>) -> Workflow {
        Workflow {
            current_step: transition.to_step,
            is_completed: transition.outcome == TransitionOutcome::Completed,
            is_rejected: transition.outcome == TransitionOutcome::Rejected,
            updated_at: at,
            ..workflow.clone()
        }
    }

    /// Check if a state transition is valid for a workflow of `total_steps`.
    ///
    /// Valid transitions:
    /// - Open(s) → Open(s + 1) while steps remain
    /// - Open(N - 1) → Completed
    /// - Open(s) → Rejected
    #[must_use]
    pub fn is_valid_transition(total_steps: u32, from: WorkflowState, to: WorkflowState) -> bool {
        match (from, to) {
            (WorkflowState::Open { step }, WorkflowState::Open { step: next }) => {
                step.checked_add(1) == Some(next) && next < total_steps
            }
            (WorkflowState::Open { step }, WorkflowState::Completed) => {
                step.checked_add(1) == Some(total_steps)
            }
            (WorkflowState::Open { step }, WorkflowState::Rejected) => step < total_steps,
            _ => false,
        }
    }
}
