//! Audit ledger entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use docseal_shared::types::{AttemptId, DocumentId, TemplateId, UserId, WorkflowId};

use crate::integrity::Fingerprint;
use crate::workflow::types::WorkflowAction;

/// Discriminant of an [`AuditEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntryKind {
    /// A workflow advance or rejection.
    WorkflowAction,
    /// A document registration.
    DocumentCreated,
    /// A public verification query.
    VerificationAttempt,
}

impl AuditEntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowAction => "workflow_action",
            Self::DocumentCreated => "document_created",
            Self::VerificationAttempt => "verification_attempt",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workflow_action" => Some(Self::WorkflowAction),
            "document_created" => Some(Self::DocumentCreated),
            "verification_attempt" => Some(Self::VerificationAttempt),
            _ => None,
        }
    }
}

impl fmt::Display for AuditEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration of a document and its workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreated {
    /// New document.
    pub document_id: DocumentId,
    /// Workflow created with it.
    pub workflow_id: WorkflowId,
    /// Template the workflow was snapshotted from.
    pub template_id: TemplateId,
    /// Uploading user.
    pub owner_id: UserId,
    /// Content fingerprint.
    pub fingerprint: Fingerprint,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// One public verification query, matched or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    /// Attempt ID.
    pub id: AttemptId,
    /// Digest as supplied by the caller (trimmed, length-capped).
    pub fingerprint: String,
    /// Whether a document matched.
    pub matched: bool,
    /// Matched document; never exposed to the caller.
    pub document_id: Option<DocumentId>,
    /// Caller address.
    pub ip_address: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
    /// Query time.
    pub created_at: DateTime<Utc>,
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum AuditEntry {
    /// Workflow transition.
    WorkflowAction(WorkflowAction),
    /// Document registration.
    DocumentCreated(DocumentCreated),
    /// Verification query.
    VerificationAttempt(VerificationAttempt),
}

impl AuditEntry {
    /// Entry kind.
    #[must_use]
    pub const fn kind(&self) -> AuditEntryKind {
        match self {
            Self::WorkflowAction(_) => AuditEntryKind::WorkflowAction,
            Self::DocumentCreated(_) => AuditEntryKind::DocumentCreated,
            Self::VerificationAttempt(_) => AuditEntryKind::VerificationAttempt,
        }
    }

    /// Document the entry concerns, if any.
    #[must_use]
    pub const fn document_id(&self) -> Option<DocumentId> {
        match self {
            Self::WorkflowAction(a) => Some(a.document_id),
            Self::DocumentCreated(c) => Some(c.document_id),
            Self::VerificationAttempt(v) => v.document_id,
        }
    }

    /// Workflow the entry concerns, if any.
    #[must_use]
    pub const fn workflow_id(&self) -> Option<WorkflowId> {
        match self {
            Self::WorkflowAction(a) => Some(a.workflow_id),
            Self::DocumentCreated(c) => Some(c.workflow_id),
            Self::VerificationAttempt(_) => None,
        }
    }

    /// Acting user, if any.
    #[must_use]
    pub const fn actor_id(&self) -> Option<UserId> {
        match self {
            Self::WorkflowAction(a) => Some(a.actor_id),
            Self::DocumentCreated(c) => Some(c.owner_id),
            Self::VerificationAttempt(_) => None,
        }
    }

    /// When the recorded event happened.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::WorkflowAction(a) => a.created_at,
            Self::DocumentCreated(c) => c.created_at,
            Self::VerificationAttempt(v) => v.created_at,
        }
    }
}

/// Stored entry with its ledger position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Strictly increasing position in the ledger.
    pub sequence: i64,
    /// The entry.
    pub entry: AuditEntry,
    /// When the ledger stored the entry.
    pub recorded_at: DateTime<Utc>,
}

/// Conjunctive filter over ledger entries. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Only entries for this document.
    pub document_id: Option<DocumentId>,
    /// Only entries for this workflow.
    pub workflow_id: Option<WorkflowId>,
    /// Only entries by this actor.
    pub actor_id: Option<UserId>,
    /// Only entries of this kind.
    pub kind: Option<AuditEntryKind>,
}

impl AuditFilter {
    /// Filter matching every entry.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a document.
    #[must_use]
    pub fn for_document(mut self, id: DocumentId) -> Self {
        self.document_id = Some(id);
        self
    }

    /// Restrict to a workflow.
    #[must_use]
    pub fn for_workflow(mut self, id: WorkflowId) -> Self {
        self.workflow_id = Some(id);
        self
    }

    /// Restrict to an actor.
    #[must_use]
    pub fn for_actor(mut self, id: UserId) -> Self {
        self.actor_id = Some(id);
        self
    }

    /// Restrict to a kind.
    #[must_use]
    pub fn of_kind(mut self, kind: AuditEntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns true if `entry` passes every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.document_id.is_none_or(|id| entry.document_id() == Some(id))
            && self.workflow_id.is_none_or(|id| entry.workflow_id() == Some(id))
            && self.actor_id.is_none_or(|id| entry.actor_id() == Some(id))
            && self.kind.is_none_or(|kind| entry.kind() == kind)
    }
}
