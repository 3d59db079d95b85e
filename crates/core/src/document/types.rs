//! Document and template domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use docseal_shared::types::{DocumentId, TemplateId, UserId};

use crate::integrity::Fingerprint;
use crate::workflow::types::ApprovalPath;

/// Document status, projected from its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Registered, no step taken yet.
    Pending,
    /// At least one step taken, more remain.
    InReview,
    /// Accepted in stored data; never derived from a workflow.
    Approved,
    /// Rejected at some step.
    Rejected,
    /// Every step taken.
    Completed,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_review" => Some(Self::InReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true for statuses no workflow can leave.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    pub id: DocumentId,
    /// Human-readable title.
    pub title: String,
    /// SHA-256 of the content; unique across all documents.
    pub fingerprint: Fingerprint,
    /// Status projected from the workflow.
    pub status: DocumentStatus,
    /// Uploading user.
    pub owner_id: UserId,
    /// Template the workflow was created from.
    pub template_id: TemplateId,
    /// Object storage key of the content.
    pub storage_key: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Content length in bytes.
    pub size_bytes: u64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Public projection without owner identity or content reference.
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Public view of a document returned by hash lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID.
    pub id: DocumentId,
    /// Title.
    pub title: String,
    /// Current status.
    pub status: DocumentStatus,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Reusable definition of a document type and its approval path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTemplate {
    /// Template ID.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Document type label, e.g. `transcript`.
    pub document_type: String,
    /// Ordered roles a document must pass through.
    pub approval_path: ApprovalPath,
    /// Inactive templates cannot start new workflows.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new template.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    /// Display name.
    pub name: String,
    /// Document type label.
    pub document_type: String,
    /// Raw role identifiers, validated on creation.
    pub approval_path: Vec<String>,
}

/// Input for registering a document.
#[derive(Debug, Clone)]
pub struct RegisterDocument {
    /// Uploading user.
    pub owner_id: UserId,
    /// Template to route the document through.
    pub template_id: TemplateId,
    /// Title.
    pub title: String,
    /// Original filename, used for the storage key.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Document bytes.
    pub content: bytes::Bytes,
}
