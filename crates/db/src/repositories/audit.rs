//! Audit ledger storage.
//!
//! Every append takes a transaction-scoped advisory lock before drawing a
//! sequence number, so sequence order equals commit order and a reader
//! paging by `sequence > after` never skips a late-committing row.
//!
//! The lock is global, so ledger-writing commits are serialized across all
//! workflows, not only per workflow. `append_in` is the last statement before
//! `COMMIT` in every caller, which keeps the held section to one insert plus
//! the commit round trip. If that becomes the throughput ceiling, replace the
//! lock with a commit-time watermark that readers page against.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use docseal_core::audit::{AuditEntry, AuditError, AuditFilter, AuditRecord, AuditStore};

use crate::convert::{entry_to_active, record_to_domain};
use crate::entities::audit_entries;

const LEDGER_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(7402115001)";

/// Append `entry` inside an open transaction.
///
/// The caller must commit the transaction for the entry to become visible.
pub(crate) async fn append_in<C: ConnectionTrait>(
    conn: &C,
    entry: &AuditEntry,
) -> Result<AuditRecord, DbErr> {
    conn.execute_unprepared(LEDGER_LOCK_SQL).await?;
    let model = entry_to_active(entry)
        .map_err(DbErr::Custom)?
        .insert(conn)
        .await?;
    record_to_domain(model).map_err(DbErr::Custom)
}

/// Postgres-backed [`AuditStore`].
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    db: DatabaseConnection,
}

impl PgAuditStore {
    /// Creates a new audit store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn storage(e: DbErr) -> AuditError {
    AuditError::storage(e.to_string())
}

impl AuditStore for PgAuditStore {
    async fn append(&self, entry: AuditEntry) -> Result<AuditRecord, AuditError> {
        let txn = self.db.begin().await.map_err(storage)?;
        let record = append_in(&txn, &entry).await.map_err(storage)?;
        txn.commit().await.map_err(storage)?;

        tracing::debug!(sequence = record.sequence, kind = %entry.kind(), "Ledger entry stored");
        Ok(record)
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<i64>,
        limit: u64,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let mut query = audit_entries::Entity::find();

        if let Some(id) = filter.document_id {
            query = query.filter(audit_entries::Column::DocumentId.eq(id.into_inner()));
        }
        if let Some(id) = filter.workflow_id {
            query = query.filter(audit_entries::Column::WorkflowId.eq(id.into_inner()));
        }
        if let Some(id) = filter.actor_id {
            query = query.filter(audit_entries::Column::ActorId.eq(id.into_inner()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(audit_entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(after) = after {
            query = query.filter(audit_entries::Column::Sequence.gt(after));
        }

        let rows = query
            .order_by_asc(audit_entries::Column::Sequence)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage)?;

        rows.into_iter()
            .map(record_to_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AuditError::storage)
    }
}
