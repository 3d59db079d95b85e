//! Workflow domain types for document approval routing.
//!
//! A workflow is a fixed, linear sequence of role-gated steps snapshotted
//! from a template when the document is registered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use docseal_shared::types::{ActionId, DocumentId, UserId, WorkflowId};

use crate::document::DocumentStatus;
use crate::workflow::error::WorkflowError;

/// Institutional role an actor holds when acting on a step.
///
/// Matching is exact: there is no hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enrolled student.
    Student,
    /// Teaching or research staff.
    AcademicStaff,
    /// Administrative staff.
    AdministrativeStaff,
    /// Head of an academic department.
    DepartmentHead,
    /// Faculty dean.
    Dean,
    /// Registrar's office.
    Registrar,
    /// System administrator.
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Student,
        Self::AcademicStaff,
        Self::AdministrativeStaff,
        Self::DepartmentHead,
        Self::Dean,
        Self::Registrar,
        Self::Admin,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::AcademicStaff => "academic_staff",
            Self::AdministrativeStaff => "administrative_staff",
            Self::DepartmentHead => "department_head",
            Self::Dean => "dean",
            Self::Registrar => "registrar",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|r| r.as_str() == normalized)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, non-empty ordered sequence of roles.
///
/// Used both as a template's approval path and as a workflow's
/// `step_roles` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct ApprovalPath(Vec<Role>);

impl ApprovalPath {
    /// Creates a path from already-typed roles.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTemplate` if `roles` is empty.
    pub fn new(roles: Vec<Role>) -> Result<Self, WorkflowError> {
        if roles.is_empty() {
            return Err(WorkflowError::InvalidTemplate(
                "approval path must contain at least one role".to_string(),
            ));
        }
        if u32::try_from(roles.len()).is_err() {
            return Err(WorkflowError::InvalidTemplate(
                "approval path is too long".to_string(),
            ));
        }
        Ok(Self(roles))
    }

    /// Parses role identifiers, rejecting unknown roles up front.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTemplate` for an empty path or an
    /// unknown role identifier.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, WorkflowError> {
        let roles = raw
            .iter()
            .map(|s| {
                Role::parse(s.as_ref()).ok_or_else(|| {
                    WorkflowError::InvalidTemplate(format!("unknown role '{}'", s.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(roles)
    }

    /// The roles in step order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.0
    }

    /// Number of steps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // bounded in `new`
    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Role required at `step`, if the step exists.
    #[must_use]
    pub fn role_at(&self, step: u32) -> Option<Role> {
        usize::try_from(step).ok().and_then(|i| self.0.get(i).copied())
    }
}

impl TryFrom<Vec<Role>> for ApprovalPath {
    type Error = WorkflowError;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(roles)
    }
}

impl From<ApprovalPath> for Vec<Role> {
    fn from(path: ApprovalPath) -> Self {
        path.0
    }
}

/// Kind of action recorded against a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowActionKind {
    /// Document uploaded (creation event, never an advance).
    Uploaded,
    /// Step reviewed.
    Reviewed,
    /// Step approved.
    Approved,
    /// Document rejected; terminal.
    Rejected,
    /// Step signed.
    Signed,
    /// Step forwarded to the next role.
    Forwarded,
    /// Step marked complete.
    Completed,
}

impl WorkflowActionKind {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Signed => "signed",
            Self::Forwarded => "forwarded",
            Self::Completed => "completed",
        }
    }

    /// Parses an action kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "uploaded" => Some(Self::Uploaded),
            "reviewed" => Some(Self::Reviewed),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "signed" => Some(Self::Signed),
            "forwarded" => Some(Self::Forwarded),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true if this action moves the workflow to the next step.
    #[must_use]
    pub const fn is_advancing(&self) -> bool {
        matches!(
            self,
            Self::Reviewed | Self::Approved | Self::Signed | Self::Forwarded | Self::Completed
        )
    }
}

impl fmt::Display for WorkflowActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user acting on a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Role the user acts under.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Position of a workflow in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Waiting on the role at `step`.
    Open {
        /// Current step index.
        step: u32,
    },
    /// Every step taken; absorbing.
    Completed,
    /// Rejected at some step; absorbing.
    Rejected,
}

impl WorkflowState {
    /// Returns true for the absorbing states.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

/// Approval workflow owned by exactly one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow ID.
    pub id: WorkflowId,
    /// Owning document.
    pub document_id: DocumentId,
    /// Role sequence, fixed at creation.
    pub step_roles: ApprovalPath,
    /// Index of the step awaiting action (`0..=total_steps`).
    pub current_step: u32,
    /// True iff `current_step == total_steps`.
    pub is_completed: bool,
    /// True once a `rejected` action was recorded.
    pub is_rejected: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last transition time.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Number of steps, equal to `step_roles.len()`.
    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.step_roles.len()
    }

    /// Current state-machine position.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        if self.is_rejected {
            WorkflowState::Rejected
        } else if self.is_completed {
            WorkflowState::Completed
        } else {
            WorkflowState::Open {
                step: self.current_step,
            }
        }
    }

    /// Role that may act next, or `None` for a terminal workflow.
    #[must_use]
    pub fn required_role(&self) -> Option<Role> {
        match self.state() {
            WorkflowState::Open { step } => self.step_roles.role_at(step),
            WorkflowState::Completed | WorkflowState::Rejected => None,
        }
    }

    /// Document status projected from this workflow.
    #[must_use]
    pub fn document_status(&self) -> DocumentStatus {
        match self.state() {
            WorkflowState::Rejected => DocumentStatus::Rejected,
            WorkflowState::Completed => DocumentStatus::Completed,
            WorkflowState::Open { step: 0 } => DocumentStatus::Pending,
            WorkflowState::Open { .. } => DocumentStatus::InReview,
        }
    }
}

/// Immutable record of one successful advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAction {
    /// Action ID.
    pub id: ActionId,
    /// Workflow acted on.
    pub workflow_id: WorkflowId,
    /// Document the workflow belongs to.
    pub document_id: DocumentId,
    /// Acting user.
    pub actor_id: UserId,
    /// What the actor did.
    pub action: WorkflowActionKind,
    /// Step index the action was taken at (before any increment).
    pub step: u32,
    /// Optional comment.
    pub comment: Option<String>,
    /// Sealed signature payload, if one was supplied.
    pub signature: Option<String>,
    /// When the action was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for `WorkflowEngine::advance`.
#[derive(Debug, Clone)]
pub struct AdvanceRequest {
    /// Workflow to advance.
    pub workflow_id: WorkflowId,
    /// Acting user and role.
    pub actor: Actor,
    /// Action kind.
    pub action: WorkflowActionKind,
    /// Optional comment.
    pub comment: Option<String>,
    /// Optional plaintext signature payload (sealed before storage).
    pub signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(roles: &[Role], step: u32) -> Workflow {
        let path = ApprovalPath::new(roles.to_vec()).unwrap();
        let total = path.len();
        Workflow {
            id: WorkflowId::new(),
            document_id: DocumentId::new(),
            step_roles: path,
            current_step: step,
            is_completed: step == total,
            is_rejected: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip_strings() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse(" Department_Head "), Some(Role::DepartmentHead));
        assert_eq!(Role::parse("provost"), None);
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::AcademicStaff).unwrap();
        assert_eq!(json, "\"academic_staff\"");
    }

    #[test]
    fn test_approval_path_rejects_empty() {
        let result = ApprovalPath::new(vec![]);
        assert!(matches!(result, Err(WorkflowError::InvalidTemplate(_))));
    }

    #[test]
    fn test_approval_path_rejects_unknown_role() {
        let result = ApprovalPath::parse(&["academic_staff", "chancellor"]);
        match result {
            Err(WorkflowError::InvalidTemplate(msg)) => assert!(msg.contains("chancellor")),
            other => panic!("expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn test_approval_path_deserialize_validates() {
        let ok: ApprovalPath = serde_json::from_str(r#"["dean","registrar"]"#).unwrap();
        assert_eq!(ok.roles(), &[Role::Dean, Role::Registrar]);
        assert!(serde_json::from_str::<ApprovalPath>("[]").is_err());
        assert!(serde_json::from_str::<ApprovalPath>(r#"["janitor"]"#).is_err());
    }

    #[test]
    fn test_role_at() {
        let path = ApprovalPath::new(vec![Role::AcademicStaff, Role::Dean]).unwrap();
        assert_eq!(path.role_at(0), Some(Role::AcademicStaff));
        assert_eq!(path.role_at(1), Some(Role::Dean));
        assert_eq!(path.role_at(2), None);
    }

    #[test]
    fn test_action_kind_parse() {
        assert_eq!(
            WorkflowActionKind::parse("APPROVED"),
            Some(WorkflowActionKind::Approved)
        );
        assert_eq!(WorkflowActionKind::parse("voided"), None);
        assert!(!WorkflowActionKind::Uploaded.is_advancing());
        assert!(!WorkflowActionKind::Rejected.is_advancing());
        assert!(WorkflowActionKind::Signed.is_advancing());
    }

    #[test]
    fn test_workflow_state_and_status_projection() {
        let roles = [Role::AcademicStaff, Role::DepartmentHead, Role::Dean];

        let fresh = workflow(&roles, 0);
        assert_eq!(fresh.state(), WorkflowState::Open { step: 0 });
        assert_eq!(fresh.required_role(), Some(Role::AcademicStaff));
        assert_eq!(fresh.document_status(), DocumentStatus::Pending);

        let mid = workflow(&roles, 2);
        assert_eq!(mid.required_role(), Some(Role::Dean));
        assert_eq!(mid.document_status(), DocumentStatus::InReview);

        let done = workflow(&roles, 3);
        assert_eq!(done.state(), WorkflowState::Completed);
        assert_eq!(done.required_role(), None);
        assert_eq!(done.document_status(), DocumentStatus::Completed);

        let mut rejected = workflow(&roles, 1);
        rejected.is_rejected = true;
        assert_eq!(rejected.state(), WorkflowState::Rejected);
        assert_eq!(rejected.document_status(), DocumentStatus::Rejected);
    }
}
