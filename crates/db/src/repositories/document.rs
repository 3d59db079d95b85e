//! Document and template repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

use docseal_core::audit::{AuditEntry, AuditRecord};
use docseal_core::document::{Document, DocumentError, DocumentRepository, DocumentTemplate};
use docseal_core::integrity::Fingerprint;
use docseal_core::workflow::Workflow;
use docseal_shared::types::{DocumentId, TemplateId, UserId};

use super::audit::append_in;
use crate::convert::{
    document_to_active, document_to_domain, template_to_active, template_to_domain,
    workflow_to_active,
};
use crate::entities::{document_templates, documents};

const FINGERPRINT_CONSTRAINT: &str = "uq_documents_fingerprint";

/// Postgres-backed [`DocumentRepository`].
#[derive(Debug, Clone)]
pub struct PgDocumentRepository {
    db: DatabaseConnection,
}

impl PgDocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> DocumentError {
    DocumentError::repository(e.to_string())
}

fn is_fingerprint_violation(e: &DbErr) -> bool {
    matches!(
        e.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains(FINGERPRINT_CONSTRAINT)
    )
}

impl DocumentRepository for PgDocumentRepository {
    async fn create_template(
        &self,
        template: DocumentTemplate,
    ) -> Result<DocumentTemplate, DocumentError> {
        let model = template_to_active(&template)
            .map_err(DocumentError::repository)?
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        template_to_domain(model).map_err(DocumentError::repository)
    }

    async fn find_template(&self, id: TemplateId) -> Result<Option<DocumentTemplate>, DocumentError> {
        document_templates::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(template_to_domain)
            .transpose()
            .map_err(DocumentError::repository)
    }

    async fn list_templates(&self, active_only: bool) -> Result<Vec<DocumentTemplate>, DocumentError> {
        let mut query = document_templates::Entity::find();
        if active_only {
            query = query.filter(document_templates::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(document_templates::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(template_to_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DocumentError::repository)
    }

    async fn set_template_active(
        &self,
        id: TemplateId,
        active: bool,
    ) -> Result<Option<DocumentTemplate>, DocumentError> {
        let Some(model) = document_templates::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut model: document_templates::ActiveModel = model.into();
        model.is_active = Set(active);
        let updated = model.update(&self.db).await.map_err(db_err)?;
        template_to_domain(updated)
            .map(Some)
            .map_err(DocumentError::repository)
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DocumentError> {
        documents::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(document_to_domain)
            .transpose()
            .map_err(DocumentError::repository)
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Document>, DocumentError> {
        documents::Entity::find()
            .filter(documents::Column::Fingerprint.eq(fingerprint.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(document_to_domain)
            .transpose()
            .map_err(DocumentError::repository)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Document>, DocumentError> {
        documents::Entity::find()
            .filter(documents::Column::OwnerId.eq(owner.into_inner()))
            .order_by_desc(documents::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(document_to_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DocumentError::repository)
    }

    async fn create_with_workflow(
        &self,
        document: Document,
        workflow: Workflow,
        entry: AuditEntry,
    ) -> Result<AuditRecord, DocumentError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let inserted = document_to_active(&document)
            .map_err(DocumentError::repository)?
            .insert(&txn)
            .await;
        if let Err(e) = inserted {
            return Err(if is_fingerprint_violation(&e) {
                DocumentError::HashCollision {
                    fingerprint: document.fingerprint,
                }
            } else {
                db_err(e)
            });
        }

        workflow_to_active(&workflow)
            .map_err(DocumentError::repository)?
            .insert(&txn)
            .await
            .map_err(db_err)?;

        let record = append_in(&txn, &entry).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(
            document_id = %document.id,
            workflow_id = %workflow.id,
            sequence = record.sequence,
            "Document registered"
        );
        Ok(record)
    }
}
