//! Workflow repository with compare-and-swap transitions.

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use docseal_core::audit::AuditRecord;
use docseal_core::workflow::{TransitionCommit, Workflow, WorkflowAction, WorkflowError, WorkflowRepository};
use docseal_shared::types::{DocumentId, WorkflowId};

use super::audit::append_in;
use crate::convert::{action_to_active, action_to_domain, step_to_db, workflow_to_domain};
use crate::entities::{documents, workflow_actions, workflows};

/// Postgres-backed [`WorkflowRepository`].
#[derive(Debug, Clone)]
pub struct PgWorkflowRepository {
    db: DatabaseConnection,
}

impl PgWorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> WorkflowError {
    WorkflowError::repository(e.to_string())
}

impl WorkflowRepository for PgWorkflowRepository {
    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, WorkflowError> {
        workflows::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(workflow_to_domain)
            .transpose()
            .map_err(WorkflowError::repository)
    }

    async fn find_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<Workflow>, WorkflowError> {
        workflows::Entity::find()
            .filter(workflows::Column::DocumentId.eq(document_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(workflow_to_domain)
            .transpose()
            .map_err(WorkflowError::repository)
    }

    async fn list_actions(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowAction>, WorkflowError> {
        workflow_actions::Entity::find()
            .filter(workflow_actions::Column::WorkflowId.eq(workflow_id.into_inner()))
            .order_by_asc(workflow_actions::Column::Step)
            .order_by_asc(workflow_actions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(action_to_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(WorkflowError::repository)
    }

    /// Applies the transition only if the stored workflow is still open at
    /// `expected_step`. The workflow update, action insert, document status
    /// update and ledger append commit together or not at all.
    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<AuditRecord, WorkflowError> {
        let TransitionCommit {
            workflow,
            expected_step,
            action,
            document_status,
            ledger_entry,
        } = commit;
        let id = workflow.id.into_inner();

        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = workflows::Entity::update_many()
            .col_expr(
                workflows::Column::CurrentStep,
                Expr::value(step_to_db(workflow.current_step).map_err(WorkflowError::repository)?),
            )
            .col_expr(workflows::Column::IsCompleted, Expr::value(workflow.is_completed))
            .col_expr(workflows::Column::IsRejected, Expr::value(workflow.is_rejected))
            .col_expr(
                workflows::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(workflow.updated_at)),
            )
            .filter(workflows::Column::Id.eq(id))
            .filter(
                workflows::Column::CurrentStep
                    .eq(step_to_db(expected_step).map_err(WorkflowError::repository)?),
            )
            .filter(workflows::Column::IsCompleted.eq(false))
            .filter(workflows::Column::IsRejected.eq(false))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if updated.rows_affected == 0 {
            let exists = workflows::Entity::find_by_id(id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_some();
            txn.rollback().await.map_err(db_err)?;
            return Err(if exists {
                WorkflowError::ConcurrentModification {
                    workflow_id: workflow.id,
                    expected_step,
                }
            } else {
                WorkflowError::NotFound(workflow.id)
            });
        }

        action_to_active(&action)
            .map_err(WorkflowError::repository)?
            .insert(&txn)
            .await
            .map_err(db_err)?;

        documents::Entity::update_many()
            .col_expr(
                documents::Column::Status,
                Expr::value(document_status.as_str().to_string()),
            )
            .filter(documents::Column::Id.eq(workflow.document_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let record = append_in(&txn, &ledger_entry).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(
            workflow_id = %workflow.id,
            step = action.step,
            sequence = record.sequence,
            "Transition committed"
        );
        Ok(record)
    }
}
