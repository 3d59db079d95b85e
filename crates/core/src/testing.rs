//! In-memory repositories for unit tests.
//!
//! One mutex guards all state, so each trait method is atomic the same way
//! a database transaction is. `commit_transition` enforces the same
//! compare-and-swap contract as the SQL implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::Barrier;

use docseal_shared::types::{DocumentId, TemplateId, UserId, WorkflowId};

use crate::audit::{AuditEntry, AuditError, AuditFilter, AuditRecord, AuditStore, DocumentCreated};
use crate::document::{Document, DocumentError, DocumentRepository, DocumentStatus, DocumentTemplate};
use crate::integrity::Fingerprint;
use crate::vault::SignatureVault;
use crate::workflow::engine::{TransitionCommit, WorkflowRepository};
use crate::workflow::types::{ApprovalPath, Role, Workflow, WorkflowAction};
use crate::workflow::{WorkflowError, WorkflowService};

#[derive(Default)]
struct State {
    templates: HashMap<TemplateId, DocumentTemplate>,
    documents: HashMap<DocumentId, Document>,
    workflows: HashMap<WorkflowId, Workflow>,
    actions: Vec<WorkflowAction>,
    audit: Vec<AuditRecord>,
    refused_documents: Vec<Document>,
}

impl State {
    fn push_audit(&mut self, entry: AuditEntry) -> AuditRecord {
        let record = AuditRecord {
            sequence: i64::try_from(self.audit.len()).unwrap_or(i64::MAX) + 1,
            entry,
            recorded_at: Utc::now(),
        };
        self.audit.push(record.clone());
        record
    }
}

/// Shared in-memory store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_audit: AtomicBool,
    collide_documents: AtomicBool,
    commit_gate: Mutex<Option<(Arc<Barrier>, usize)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every ledger write fail.
    pub fn fail_audit_appends(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Make document inserts fail as if a concurrent insert won the
    /// fingerprint.
    pub fn fail_document_inserts_with_collision(&self, fail: bool) {
        self.collide_documents.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `n` commits until all `n` have arrived.
    pub fn pause_commits(&self, n: usize) {
        *self.commit_gate.lock().unwrap() = Some((Arc::new(Barrier::new(n)), n));
    }

    /// Documents whose insert was refused, in call order.
    pub fn refused_documents(&self) -> Vec<Document> {
        self.state().refused_documents.clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state().documents.values().cloned().collect()
    }

    pub fn document_status(&self, id: DocumentId) -> Option<DocumentStatus> {
        self.state().documents.get(&id).map(|d| d.status)
    }

    fn audit_failure(&self) -> bool {
        self.fail_audit.load(Ordering::SeqCst)
    }

    fn take_gate(&self) -> Option<Arc<Barrier>> {
        let mut gate = self.commit_gate.lock().unwrap();
        let (barrier, remaining) = gate.as_mut()?;
        let barrier = Arc::clone(barrier);
        *remaining -= 1;
        if *remaining == 0 {
            *gate = None;
        }
        Some(barrier)
    }
}

impl AuditStore for InMemoryStore {
    async fn append(&self, entry: AuditEntry) -> Result<AuditRecord, AuditError> {
        if self.audit_failure() {
            return Err(AuditError::storage("audit store unavailable"));
        }
        Ok(self.state().push_audit(entry))
    }

    async fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<i64>,
        limit: u64,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let after = after.unwrap_or(0);
        Ok(self
            .state()
            .audit
            .iter()
            .filter(|r| r.sequence > after && filter.matches(&r.entry))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

impl WorkflowRepository for InMemoryStore {
    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, WorkflowError> {
        Ok(self.state().workflows.get(&id).cloned())
    }

    async fn find_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<Workflow>, WorkflowError> {
        Ok(self
            .state()
            .workflows
            .values()
            .find(|w| w.document_id == document_id)
            .cloned())
    }

    async fn list_actions(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowAction>, WorkflowError> {
        Ok(self
            .state()
            .actions
            .iter()
            .filter(|a| a.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<AuditRecord, WorkflowError> {
        if let Some(barrier) = self.take_gate() {
            barrier.wait().await;
        }

        let fail_audit = self.audit_failure();
        let mut state = self.state();
        let id = commit.workflow.id;
        let current = state
            .workflows
            .get(&id)
            .ok_or(WorkflowError::NotFound(id))?;

        if current.current_step != commit.expected_step || current.is_completed || current.is_rejected
        {
            return Err(WorkflowError::ConcurrentModification {
                workflow_id: id,
                expected_step: commit.expected_step,
            });
        }
        if fail_audit {
            return Err(WorkflowError::repository("audit store unavailable"));
        }

        let document_id = commit.workflow.document_id;
        state.workflows.insert(id, commit.workflow);
        state.actions.push(commit.action);
        if let Some(doc) = state.documents.get_mut(&document_id) {
            doc.status = commit.document_status;
        }
        Ok(state.push_audit(commit.ledger_entry))
    }
}

impl DocumentRepository for InMemoryStore {
    async fn create_template(
        &self,
        template: DocumentTemplate,
    ) -> Result<DocumentTemplate, DocumentError> {
        self.state().templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn find_template(&self, id: TemplateId) -> Result<Option<DocumentTemplate>, DocumentError> {
        Ok(self.state().templates.get(&id).cloned())
    }

    async fn list_templates(&self, active_only: bool) -> Result<Vec<DocumentTemplate>, DocumentError> {
        let mut templates: Vec<_> = self
            .state()
            .templates
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.created_at);
        Ok(templates)
    }

    async fn set_template_active(
        &self,
        id: TemplateId,
        active: bool,
    ) -> Result<Option<DocumentTemplate>, DocumentError> {
        Ok(self.state().templates.get_mut(&id).map(|t| {
            t.is_active = active;
            t.clone()
        }))
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DocumentError> {
        Ok(self.state().documents.get(&id).cloned())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Document>, DocumentError> {
        Ok(self
            .state()
            .documents
            .values()
            .find(|d| d.fingerprint == *fingerprint)
            .cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Document>, DocumentError> {
        let mut docs: Vec<_> = self
            .state()
            .documents
            .values()
            .filter(|d| d.owner_id == owner)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn create_with_workflow(
        &self,
        document: Document,
        workflow: Workflow,
        entry: AuditEntry,
    ) -> Result<AuditRecord, DocumentError> {
        let collide = self.collide_documents.load(Ordering::SeqCst);
        let fail_audit = self.audit_failure();
        let mut state = self.state();

        if collide
            || state
                .documents
                .values()
                .any(|d| d.fingerprint == document.fingerprint)
        {
            let fingerprint = document.fingerprint.clone();
            state.refused_documents.push(document);
            return Err(DocumentError::HashCollision { fingerprint });
        }
        if fail_audit {
            state.refused_documents.push(document);
            return Err(DocumentError::repository("audit store unavailable"));
        }

        state.documents.insert(document.id, document);
        state.workflows.insert(workflow.id, workflow);
        Ok(state.push_audit(entry))
    }
}

/// Vault with minimal KDF cost.
pub fn fast_vault() -> SignatureVault {
    SignatureVault::new("test-vault-key", 64, 1).unwrap()
}

/// Register a document with content `content` routed through `roles`.
pub async fn seed(store: &InMemoryStore, content: &[u8], roles: &[Role]) -> (Document, Workflow) {
    let template = DocumentTemplate {
        id: TemplateId::new(),
        name: "Seeded".to_string(),
        document_type: "test".to_string(),
        approval_path: ApprovalPath::new(roles.to_vec()).unwrap(),
        is_active: true,
        created_at: Utc::now(),
    };
    store.create_template(template.clone()).await.unwrap();

    let document_id = DocumentId::new();
    let workflow = WorkflowService::instantiate(&template, document_id).unwrap();
    let fingerprint = Fingerprint::of(content);
    let document = Document {
        id: document_id,
        title: "Seeded document".to_string(),
        fingerprint: fingerprint.clone(),
        status: DocumentStatus::Pending,
        owner_id: UserId::new(),
        template_id: template.id,
        storage_key: format!("documents/{fingerprint}/{document_id}/seeded.pdf"),
        content_type: "application/pdf".to_string(),
        size_bytes: content.len() as u64,
        created_at: workflow.created_at,
    };
    let entry = AuditEntry::DocumentCreated(DocumentCreated {
        document_id,
        workflow_id: workflow.id,
        template_id: template.id,
        owner_id: document.owner_id,
        fingerprint,
        created_at: document.created_at,
    });
    store
        .create_with_workflow(document.clone(), workflow.clone(), entry)
        .await
        .unwrap();
    (document, workflow)
}

/// Seed a single-step document and return it.
pub async fn seed_document(store: &InMemoryStore, content: &[u8]) -> Document {
    seed(store, content, &[Role::Registrar]).await.0
}

/// Seed a document with a fresh random content and return its workflow.
pub async fn seed_workflow(store: &InMemoryStore, roles: &[Role]) -> Workflow {
    let content = WorkflowId::new().to_string();
    seed(store, content.as_bytes(), roles).await.1
}
