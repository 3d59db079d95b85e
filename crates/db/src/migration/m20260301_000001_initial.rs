//! Initial database migration.
//!
//! Creates templates, documents, workflows, workflow actions and the audit
//! ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(DOCUMENT_TEMPLATES_SQL).await?;
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(WORKFLOWS_SQL).await?;
        db.execute_unprepared(WORKFLOW_ACTIONS_SQL).await?;
        db.execute_unprepared(AUDIT_ENTRIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS audit_entries CASCADE;
DROP TABLE IF EXISTS workflow_actions CASCADE;
DROP TABLE IF EXISTS workflows CASCADE;
DROP TABLE IF EXISTS documents CASCADE;
DROP TABLE IF EXISTS document_templates CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const DOCUMENT_TEMPLATES_SQL: &str = r"
CREATE TABLE document_templates (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    document_type VARCHAR(100) NOT NULL,
    approval_path JSONB NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_approval_path_non_empty CHECK (
        jsonb_typeof(approval_path) = 'array' AND jsonb_array_length(approval_path) > 0
    )
);

CREATE INDEX idx_document_templates_active ON document_templates(created_at) WHERE is_active;
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id UUID PRIMARY KEY,
    title VARCHAR(500) NOT NULL,
    fingerprint CHAR(64) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    owner_id UUID NOT NULL,
    template_id UUID NOT NULL REFERENCES document_templates(id) ON DELETE RESTRICT,
    storage_key VARCHAR(1024) NOT NULL,
    content_type VARCHAR(255) NOT NULL,
    size_bytes BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_documents_fingerprint UNIQUE (fingerprint),
    CONSTRAINT chk_fingerprint_hex CHECK (fingerprint ~ '^[0-9a-f]{64}$'),
    CONSTRAINT chk_document_status CHECK (
        status IN ('pending', 'in_review', 'approved', 'rejected', 'completed')
    ),
    CONSTRAINT chk_size_non_negative CHECK (size_bytes >= 0)
);

CREATE INDEX idx_documents_owner ON documents(owner_id, created_at DESC);
";

const WORKFLOWS_SQL: &str = r"
CREATE TABLE workflows (
    id UUID PRIMARY KEY,
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE RESTRICT,
    step_roles JSONB NOT NULL,
    current_step INTEGER NOT NULL DEFAULT 0,
    is_completed BOOLEAN NOT NULL DEFAULT FALSE,
    is_rejected BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_workflows_document UNIQUE (document_id),
    CONSTRAINT chk_step_roles_non_empty CHECK (
        jsonb_typeof(step_roles) = 'array' AND jsonb_array_length(step_roles) > 0
    ),
    CONSTRAINT chk_current_step_range CHECK (
        current_step >= 0 AND current_step <= jsonb_array_length(step_roles)
    ),
    CONSTRAINT chk_completed_at_end CHECK (
        is_completed = (current_step = jsonb_array_length(step_roles))
    ),
    CONSTRAINT chk_not_completed_and_rejected CHECK (NOT (is_completed AND is_rejected))
);
";

const WORKFLOW_ACTIONS_SQL: &str = r"
CREATE TABLE workflow_actions (
    id UUID PRIMARY KEY,
    workflow_id UUID NOT NULL REFERENCES workflows(id) ON DELETE RESTRICT,
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE RESTRICT,
    actor_id UUID NOT NULL,
    action VARCHAR(20) NOT NULL,
    step INTEGER NOT NULL,
    comment TEXT,
    signature TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_workflow_action CHECK (
        action IN ('uploaded', 'reviewed', 'approved', 'rejected', 'signed', 'forwarded', 'completed')
    ),
    CONSTRAINT chk_action_step CHECK (step >= 0)
);

CREATE INDEX idx_workflow_actions_workflow ON workflow_actions(workflow_id, created_at);
";

const AUDIT_ENTRIES_SQL: &str = r"
CREATE TABLE audit_entries (
    sequence BIGSERIAL PRIMARY KEY,
    kind VARCHAR(32) NOT NULL,
    document_id UUID,
    workflow_id UUID,
    actor_id UUID,
    payload JSONB NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_audit_kind CHECK (
        kind IN ('workflow_action', 'document_created', 'verification_attempt')
    )
);

CREATE INDEX idx_audit_entries_document ON audit_entries(document_id, sequence) WHERE document_id IS NOT NULL;
CREATE INDEX idx_audit_entries_workflow ON audit_entries(workflow_id, sequence) WHERE workflow_id IS NOT NULL;
CREATE INDEX idx_audit_entries_actor ON audit_entries(actor_id, sequence) WHERE actor_id IS NOT NULL;
CREATE INDEX idx_audit_entries_kind ON audit_entries(kind, sequence);
";
