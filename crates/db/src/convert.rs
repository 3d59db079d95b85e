//! Conversions between `SeaORM` models and core domain types.
//!
//! Rows that fail to convert indicate data written outside this crate and
//! surface as repository errors.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::prelude::DateTimeWithTimeZone;

use docseal_core::audit::{AuditEntry, AuditRecord};
use docseal_core::document::{Document, DocumentStatus, DocumentTemplate};
use docseal_core::integrity::Fingerprint;
use docseal_core::workflow::{ApprovalPath, Workflow, WorkflowAction, WorkflowActionKind};

use crate::entities::{audit_entries, document_templates, documents, workflow_actions, workflows};

fn utc(ts: DateTimeWithTimeZone) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

fn path_from_json(value: serde_json::Value, column: &str) -> Result<ApprovalPath, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid {column}: {e}"))
}

fn path_to_json(path: &ApprovalPath) -> Result<serde_json::Value, String> {
    serde_json::to_value(path).map_err(|e| e.to_string())
}

pub(crate) fn step_to_db(step: u32) -> Result<i32, String> {
    i32::try_from(step).map_err(|_| format!("step {step} exceeds column range"))
}

fn step_from_db(step: i32) -> Result<u32, String> {
    u32::try_from(step).map_err(|_| format!("negative step {step}"))
}

pub(crate) fn template_to_domain(m: document_templates::Model) -> Result<DocumentTemplate, String> {
    Ok(DocumentTemplate {
        id: m.id.into(),
        name: m.name,
        document_type: m.document_type,
        approval_path: path_from_json(m.approval_path, "approval_path")?,
        is_active: m.is_active,
        created_at: utc(m.created_at),
    })
}

pub(crate) fn template_to_active(
    t: &DocumentTemplate,
) -> Result<document_templates::ActiveModel, String> {
    Ok(document_templates::ActiveModel {
        id: Set(t.id.into_inner()),
        name: Set(t.name.clone()),
        document_type: Set(t.document_type.clone()),
        approval_path: Set(path_to_json(&t.approval_path)?),
        is_active: Set(t.is_active),
        created_at: Set(t.created_at.into()),
    })
}

pub(crate) fn document_to_domain(m: documents::Model) -> Result<Document, String> {
    Ok(Document {
        id: m.id.into(),
        title: m.title,
        fingerprint: Fingerprint::parse(&m.fingerprint).map_err(|e| e.to_string())?,
        status: DocumentStatus::parse(&m.status)
            .ok_or_else(|| format!("unknown document status '{}'", m.status))?,
        owner_id: m.owner_id.into(),
        template_id: m.template_id.into(),
        storage_key: m.storage_key,
        content_type: m.content_type,
        size_bytes: u64::try_from(m.size_bytes)
            .map_err(|_| format!("negative size {}", m.size_bytes))?,
        created_at: utc(m.created_at),
    })
}

pub(crate) fn document_to_active(d: &Document) -> Result<documents::ActiveModel, String> {
    Ok(documents::ActiveModel {
        id: Set(d.id.into_inner()),
        title: Set(d.title.clone()),
        fingerprint: Set(d.fingerprint.as_str().to_string()),
        status: Set(d.status.as_str().to_string()),
        owner_id: Set(d.owner_id.into_inner()),
        template_id: Set(d.template_id.into_inner()),
        storage_key: Set(d.storage_key.clone()),
        content_type: Set(d.content_type.clone()),
        size_bytes: Set(i64::try_from(d.size_bytes)
            .map_err(|_| format!("size {} exceeds column range", d.size_bytes))?),
        created_at: Set(d.created_at.into()),
    })
}

pub(crate) fn workflow_to_domain(m: workflows::Model) -> Result<Workflow, String> {
    Ok(Workflow {
        id: m.id.into(),
        document_id: m.document_id.into(),
        step_roles: path_from_json(m.step_roles, "step_roles")?,
        current_step: step_from_db(m.current_step)?,
        is_completed: m.is_completed,
        is_rejected: m.is_rejected,
        created_at: utc(m.created_at),
        updated_at: utc(m.updated_at),
    })
}

pub(crate) fn workflow_to_active(w: &Workflow) -> Result<workflows::ActiveModel, String> {
    Ok(workflows::ActiveModel {
        id: Set(w.id.into_inner()),
        document_id: Set(w.document_id.into_inner()),
        step_roles: Set(path_to_json(&w.step_roles)?),
        current_step: Set(step_to_db(w.current_step)?),
        is_completed: Set(w.is_completed),
        is_rejected: Set(w.is_rejected),
        created_at: Set(w.created_at.into()),
        updated_at: Set(w.updated_at.into()),
    })
}

pub(crate) fn action_to_domain(m: workflow_actions::Model) -> Result<WorkflowAction, String> {
    Ok(WorkflowAction {
        id: m.id.into(),
        workflow_id: m.workflow_id.into(),
        document_id: m.document_id.into(),
        actor_id: m.actor_id.into(),
        action: WorkflowActionKind::parse(&m.action)
            .ok_or_else(|| format!("unknown workflow action '{}'", m.action))?,
        step: step_from_db(m.step)?,
        comment: m.comment,
        signature: m.signature,
        created_at: utc(m.created_at),
    })
}

pub(crate) fn action_to_active(a: &WorkflowAction) -> Result<workflow_actions::ActiveModel, String> {
    Ok(workflow_actions::ActiveModel {
        id: Set(a.id.into_inner()),
        workflow_id: Set(a.workflow_id.into_inner()),
        document_id: Set(a.document_id.into_inner()),
        actor_id: Set(a.actor_id.into_inner()),
        action: Set(a.action.as_str().to_string()),
        step: Set(step_to_db(a.step)?),
        comment: Set(a.comment.clone()),
        signature: Set(a.signature.clone()),
        created_at: Set(a.created_at.into()),
    })
}

pub(crate) fn record_to_domain(m: audit_entries::Model) -> Result<AuditRecord, String> {
    let entry: AuditEntry = serde_json::from_value(m.payload)
        .map_err(|e| format!("invalid payload at sequence {}: {e}", m.sequence))?;
    if entry.kind().as_str() != m.kind {
        return Err(format!(
            "kind column '{}' disagrees with payload at sequence {}",
            m.kind, m.sequence
        ));
    }
    Ok(AuditRecord {
        sequence: m.sequence,
        entry,
        recorded_at: utc(m.recorded_at),
    })
}

pub(crate) fn entry_to_active(entry: &AuditEntry) -> Result<audit_entries::ActiveModel, String> {
    Ok(audit_entries::ActiveModel {
        sequence: NotSet,
        kind: Set(entry.kind().as_str().to_string()),
        document_id: Set(entry.document_id().map(|id| id.into_inner())),
        workflow_id: Set(entry.workflow_id().map(|id| id.into_inner())),
        actor_id: Set(entry.actor_id().map(|id| id.into_inner())),
        payload: Set(serde_json::to_value(entry).map_err(|e| e.to_string())?),
        recorded_at: Set(Utc::now().into()),
    })
}
