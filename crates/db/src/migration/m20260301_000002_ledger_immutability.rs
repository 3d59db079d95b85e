//! Immutability triggers.
//!
//! Ledger entries and workflow actions can never be updated or deleted,
//! and a document's fingerprint never changes after registration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FUNCTIONS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TRIGGER IF EXISTS trg_documents_fingerprint_immutable ON documents;
DROP TRIGGER IF EXISTS trg_workflow_actions_immutable ON workflow_actions;
DROP TRIGGER IF EXISTS trg_audit_entries_no_truncate ON audit_entries;
DROP TRIGGER IF EXISTS trg_audit_entries_immutable ON audit_entries;
DROP FUNCTION IF EXISTS prevent_fingerprint_change();
DROP FUNCTION IF EXISTS reject_mutation();
",
        )
        .await?;
        Ok(())
    }
}

const FUNCTIONS_SQL: &str = r"
CREATE OR REPLACE FUNCTION reject_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION '% on % is not permitted: rows are append-only', TG_OP, TG_TABLE_NAME
        USING ERRCODE = 'insufficient_privilege';
END;
$$ LANGUAGE plpgsql;

CREATE OR REPLACE FUNCTION prevent_fingerprint_change()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.fingerprint IS DISTINCT FROM OLD.fingerprint THEN
        RAISE EXCEPTION 'document fingerprint is immutable'
            USING ERRCODE = 'insufficient_privilege';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
";

const TRIGGERS_SQL: &str = r"
CREATE TRIGGER trg_audit_entries_immutable
    BEFORE UPDATE OR DELETE ON audit_entries
    FOR EACH ROW EXECUTE FUNCTION reject_mutation();

CREATE TRIGGER trg_audit_entries_no_truncate
    BEFORE TRUNCATE ON audit_entries
    FOR EACH STATEMENT EXECUTE FUNCTION reject_mutation();

CREATE TRIGGER trg_workflow_actions_immutable
    BEFORE UPDATE OR DELETE ON workflow_actions
    FOR EACH ROW EXECUTE FUNCTION reject_mutation();

CREATE TRIGGER trg_documents_fingerprint_immutable
    BEFORE UPDATE OF fingerprint ON documents
    FOR EACH ROW EXECUTE FUNCTION prevent_fingerprint_change();
";
