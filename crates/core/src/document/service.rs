//! Document registration and template management.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use docseal_shared::types::{DocumentId, TemplateId, UserId};

use crate::audit::{AuditEntry, AuditRecord, DocumentCreated};
use crate::document::error::DocumentError;
use crate::document::types::{
    CreateTemplate, Document, DocumentStatus, DocumentTemplate, RegisterDocument,
};
use crate::integrity::{Fingerprint, HashService, IntegrityReport};
use crate::storage::StorageService;
use crate::workflow::types::{ApprovalPath, Workflow};
use crate::workflow::{WorkflowError, WorkflowService};

/// Persistence for documents and templates.
pub trait DocumentRepository: Send + Sync {
    /// Store a new template.
    fn create_template(
        &self,
        template: DocumentTemplate,
    ) -> impl std::future::Future<Output = Result<DocumentTemplate, DocumentError>> + Send;

    /// Template by ID.
    fn find_template(
        &self,
        id: TemplateId,
    ) -> impl std::future::Future<Output = Result<Option<DocumentTemplate>, DocumentError>> + Send;

    /// Templates, optionally only active ones, oldest first.
    fn list_templates(
        &self,
        active_only: bool,
    ) -> impl std::future::Future<Output = Result<Vec<DocumentTemplate>, DocumentError>> + Send;

    /// Toggle a template's `is_active` flag. `None` if it does not exist.
    fn set_template_active(
        &self,
        id: TemplateId,
        active: bool,
    ) -> impl std::future::Future<Output = Result<Option<DocumentTemplate>, DocumentError>> + Send;

    /// Document by ID.
    fn find_by_id(
        &self,
        id: DocumentId,
    ) -> impl std::future::Future<Output = Result<Option<Document>, DocumentError>> + Send;

    /// Document by content fingerprint.
    fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> impl std::future::Future<Output = Result<Option<Document>, DocumentError>> + Send;

    /// Documents uploaded by `owner`, newest first.
    fn list_by_owner(
        &self,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send;

    /// Atomically persist a document, its workflow and the creation entry.
    ///
    /// Must return `DocumentError::HashCollision` if the fingerprint is
    /// already taken, including when another registration wins a race.
    fn create_with_workflow(
        &self,
        document: Document,
        workflow: Workflow,
        entry: AuditEntry,
    ) -> impl std::future::Future<Output = Result<AuditRecord, DocumentError>> + Send;
}

/// A newly registered document and its workflow.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The document.
    pub document: Document,
    /// Its approval workflow.
    pub workflow: Workflow,
    /// Ledger position of the creation entry.
    pub ledger_sequence: i64,
}

/// Document registration and lookup.
pub struct DocumentService<R: DocumentRepository> {
    repo: Arc<R>,
    storage: Arc<StorageService>,
}

impl<R: DocumentRepository> DocumentService<R> {
    /// Create a document service.
    #[must_use]
    pub fn new(repo: Arc<R>, storage: Arc<StorageService>) -> Self {
        Self { repo, storage }
    }

    /// Register a template after validating its approval path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` for a blank name, an empty path or an
    /// unknown role.
    pub async fn create_template(
        &self,
        input: CreateTemplate,
    ) -> Result<DocumentTemplate, DocumentError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(WorkflowError::InvalidTemplate("name is required".to_string()).into());
        }
        let approval_path = ApprovalPath::parse(&input.approval_path)?;

        let template = DocumentTemplate {
            id: TemplateId::new(),
            name: name.to_string(),
            document_type: input.document_type.trim().to_string(),
            approval_path,
            is_active: true,
            created_at: Utc::now(),
        };

        let template = self.repo.create_template(template).await?;
        info!(
            template_id = %template.id,
            steps = template.approval_path.len(),
            "Template created"
        );
        Ok(template)
    }

    /// Template by ID.
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` if it does not exist.
    pub async fn template(&self, id: TemplateId) -> Result<DocumentTemplate, DocumentError> {
        self.repo
            .find_template(id)
            .await?
            .ok_or(DocumentError::TemplateNotFound(id))
    }

    /// All templates, or only active ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn templates(&self, active_only: bool) -> Result<Vec<DocumentTemplate>, DocumentError> {
        self.repo.list_templates(active_only).await
    }

    /// Stop a template from starting new workflows. Existing workflows keep
    /// their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` if it does not exist.
    pub async fn deactivate_template(
        &self,
        id: TemplateId,
    ) -> Result<DocumentTemplate, DocumentError> {
        let template = self
            .repo
            .set_template_active(id, false)
            .await?
            .ok_or(DocumentError::TemplateNotFound(id))?;
        info!(template_id = %id, "Template deactivated");
        Ok(template)
    }

    /// Register a document: store its bytes, create its workflow, and
    /// record the creation in the ledger.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` / `Storage` if the upload is rejected
    /// - `TemplateNotFound` / `Workflow(InvalidTemplate)` for a bad template
    /// - `HashCollision` if the content is already registered
    pub async fn register(&self, input: RegisterDocument) -> Result<Registration, DocumentError> {
        if input.content.is_empty() {
            return Err(DocumentError::EmptyContent);
        }
        self.storage
            .validate_upload(&input.content_type, input.content.len() as u64)?;

        let template = self.template(input.template_id).await?;
        let fingerprint = HashService::<R>::fingerprint(&input.content);

        if self.repo.find_by_fingerprint(&fingerprint).await?.is_some() {
            return Err(DocumentError::HashCollision { fingerprint });
        }

        let document_id = DocumentId::new();
        let workflow = WorkflowService::instantiate(&template, document_id)?;
        let storage_key = StorageService::document_key(&fingerprint, document_id, &input.filename);

        let document = Document {
            id: document_id,
            title: input.title.trim().to_string(),
            fingerprint: fingerprint.clone(),
            status: DocumentStatus::Pending,
            owner_id: input.owner_id,
            template_id: template.id,
            storage_key: storage_key.clone(),
            content_type: input.content_type,
            size_bytes: input.content.len() as u64,
            created_at: workflow.created_at,
        };
        let entry = AuditEntry::DocumentCreated(DocumentCreated {
            document_id,
            workflow_id: workflow.id,
            template_id: template.id,
            owner_id: input.owner_id,
            fingerprint,
            created_at: document.created_at,
        });

        self.storage.write(&storage_key, input.content).await?;

        let record = match self
            .repo
            .create_with_workflow(document.clone(), workflow.clone(), entry)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    warn!(
                        storage_key = %storage_key,
                        error = %cleanup,
                        "Failed to remove content of unregistered document"
                    );
                }
                return Err(e);
            }
        };

        info!(
            document_id = %document.id,
            workflow_id = %workflow.id,
            fingerprint = %document.fingerprint,
            steps = workflow.total_steps(),
            "Document registered"
        );

        Ok(Registration {
            document,
            workflow,
            ledger_sequence: record.sequence,
        })
    }

    /// Document by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn document(&self, id: DocumentId) -> Result<Document, DocumentError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DocumentError::NotFound(id))
    }

    /// Documents uploaded by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn documents_for_owner(&self, owner: UserId) -> Result<Vec<Document>, DocumentError> {
        self.repo.list_by_owner(owner).await
    }

    /// Check that a document's stored bytes still match its fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown document, or a storage error if the
    /// content cannot be read.
    pub async fn verify_integrity(&self, id: DocumentId) -> Result<IntegrityReport, DocumentError> {
        let document = self.document(id).await?;
        Ok(HashService::<R>::verify_content(&self.storage, &document).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEntryKind, AuditFilter, AuditLedger};
    use crate::storage::StorageError;
    use crate::testing::InMemoryStore;
    use bytes::Bytes;

    fn service(store: &Arc<InMemoryStore>) -> DocumentService<InMemoryStore> {
        DocumentService::new(
            Arc::clone(store),
            Arc::new(StorageService::in_memory().unwrap()),
        )
    }

    async fn template(service: &DocumentService<InMemoryStore>) -> DocumentTemplate {
        service
            .create_template(CreateTemplate {
                name: "Transcript".to_string(),
                document_type: "transcript".to_string(),
                approval_path: vec![
                    "academic_staff".to_string(),
                    "department_head".to_string(),
                    "dean".to_string(),
                ],
            })
            .await
            .unwrap()
    }

    fn upload(template_id: TemplateId, content: &'static [u8]) -> RegisterDocument {
        RegisterDocument {
            owner_id: UserId::new(),
            template_id,
            title: " Final transcript ".to_string(),
            filename: "transcript.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: Bytes::from_static(content),
        }
    }

    #[tokio::test]
    async fn test_create_template_validates_roles() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);

        let err = service
            .create_template(CreateTemplate {
                name: "Bad".to_string(),
                document_type: "x".to_string(),
                approval_path: vec!["dean".to_string(), "wizard".to_string()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TEMPLATE");

        let err = service
            .create_template(CreateTemplate {
                name: "Empty".to_string(),
                document_type: "x".to_string(),
                approval_path: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TEMPLATE");
    }

    #[tokio::test]
    async fn test_register_creates_document_workflow_and_ledger_entry() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;

        let reg = service.register(upload(tpl.id, b"%PDF transcript")).await.unwrap();

        assert_eq!(reg.document.title, "Final transcript");
        assert_eq!(reg.document.status, DocumentStatus::Pending);
        assert_eq!(reg.document.fingerprint, Fingerprint::of(b"%PDF transcript"));
        assert_eq!(reg.workflow.document_id, reg.document.id);
        assert_eq!(reg.workflow.step_roles, tpl.approval_path);
        assert!(service.storage.exists(&reg.document.storage_key).await);

        let ledger = AuditLedger::new(Arc::clone(&store));
        let entries = ledger
            .collect(AuditFilter::all().of_kind(AuditEntryKind::DocumentCreated))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sequence, reg.ledger_sequence);
        assert_eq!(entries[0].entry.document_id(), Some(reg.document.id));
    }

    #[tokio::test]
    async fn test_register_duplicate_content_is_collision() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;

        service.register(upload(tpl.id, b"same bytes")).await.unwrap();
        let err = service.register(upload(tpl.id, b"same bytes")).await.unwrap_err();
        assert!(matches!(err, DocumentError::HashCollision { .. }));
    }

    #[tokio::test]
    async fn test_register_race_collision_cleans_up_content() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;
        store.fail_document_inserts_with_collision(true);

        let err = service.register(upload(tpl.id, b"raced")).await.unwrap_err();
        assert!(matches!(err, DocumentError::HashCollision { .. }));
        assert!(store.documents().is_empty());
        let refused = store.refused_documents();
        assert!(!service.storage.exists(&refused[0].storage_key).await);
    }

    #[tokio::test]
    async fn test_ledger_failure_aborts_registration() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;
        store.fail_audit_appends(true);

        let err = service.register(upload(tpl.id, b"unlogged")).await.unwrap_err();
        assert!(matches!(err, DocumentError::Repository(_)));
        assert!(store.documents().is_empty());

        let refused = store.refused_documents();
        assert_eq!(refused.len(), 1);
        assert!(!service.storage.exists(&refused[0].storage_key).await);

        store.fail_audit_appends(false);
        let lookup = service
            .repo
            .find_by_fingerprint(&Fingerprint::of(b"unlogged"))
            .await
            .unwrap();
        assert!(lookup.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_uploads() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;

        let err = service.register(upload(tpl.id, b"")).await.unwrap_err();
        assert!(matches!(err, DocumentError::EmptyContent));

        let mut exe = upload(tpl.id, b"MZ");
        exe.content_type = "application/x-msdownload".to_string();
        let err = service.register(exe).await.unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Storage(StorageError::InvalidMimeType { .. })
        ));

        let err = service
            .register(upload(TemplateId::new(), b"orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TemplateNotFound(_)));
    }

    #[tokio::test]
    async fn test_deactivated_template_cannot_register() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;

        let deactivated = service.deactivate_template(tpl.id).await.unwrap();
        assert!(!deactivated.is_active);
        assert!(service.templates(true).await.unwrap().is_empty());

        let err = service.register(upload(tpl.id, b"late")).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TEMPLATE");
    }

    #[tokio::test]
    async fn test_documents_for_owner_and_integrity() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let tpl = template(&service).await;

        let reg = service.register(upload(tpl.id, b"mine")).await.unwrap();
        let owned = service
            .documents_for_owner(reg.document.owner_id)
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);

        let report = service.verify_integrity(reg.document.id).await.unwrap();
        assert!(report.intact);

        let err = service.document(DocumentId::new()).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }
}
