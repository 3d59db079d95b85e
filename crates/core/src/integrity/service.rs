//! Hash lookup and at-rest integrity checks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use docseal_shared::types::DocumentId;

use crate::document::{Document, DocumentError, DocumentRepository, DocumentSummary};
use crate::integrity::fingerprint::Fingerprint;
use crate::storage::{StorageError, StorageService};

/// Outcome of a fingerprint lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashLookup {
    /// Whether a document carries the fingerprint.
    pub found: bool,
    /// Public view of the matching document.
    pub document: Option<DocumentSummary>,
}

impl HashLookup {
    fn miss() -> Self {
        Self {
            found: false,
            document: None,
        }
    }
}

/// Result of re-hashing stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Document checked.
    pub document_id: DocumentId,
    /// Fingerprint recorded at registration.
    pub expected: Fingerprint,
    /// Fingerprint of the bytes currently stored.
    pub actual: Fingerprint,
    /// True iff `expected == actual`.
    pub intact: bool,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}

/// Content hashing and fingerprint lookup.
pub struct HashService<R: DocumentRepository> {
    repo: Arc<R>,
}

impl<R: DocumentRepository> HashService<R> {
    /// Create a hash service over a document repository.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// SHA-256 fingerprint of `bytes`.
    #[must_use]
    pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
        Fingerprint::of(bytes)
    }

    /// Look up a document by a caller-supplied hex digest.
    ///
    /// Malformed digests are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn verify(&self, hex: &str) -> Result<HashLookup, DocumentError> {
        let Ok(fingerprint) = Fingerprint::parse(hex) else {
            return Ok(HashLookup::miss());
        };

        Ok(match self.lookup(&fingerprint).await? {
            Some(document) => HashLookup {
                found: true,
                document: Some(document.summary()),
            },
            None => HashLookup::miss(),
        })
    }

    /// Document registered under `fingerprint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<Document>, DocumentError> {
        self.repo.find_by_fingerprint(fingerprint).await
    }

    /// Re-read a document's stored bytes and compare their hash with the
    /// recorded fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read.
    pub async fn verify_content(
        storage: &StorageService,
        document: &Document,
    ) -> Result<IntegrityReport, StorageError> {
        let content = storage.read(&document.storage_key).await?;
        let actual = Fingerprint::of(&content);
        let intact = actual == document.fingerprint;

        if !intact {
            warn!(
                document_id = %document.id,
                expected = %document.fingerprint,
                actual = %actual,
                "stored document content no longer matches its fingerprint"
            );
        }

        Ok(IntegrityReport {
            document_id: document.id,
            expected: document.fingerprint.clone(),
            actual,
            intact,
            checked_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStore, seed_document};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_verify_known_and_unknown() {
        let store = Arc::new(InMemoryStore::new());
        let doc = seed_document(&store, b"registered content").await;
        let service = HashService::new(Arc::clone(&store));

        let hit = service.verify(doc.fingerprint.as_str()).await.unwrap();
        assert!(hit.found);
        assert_eq!(hit.document.unwrap().id, doc.id);

        let upper = doc.fingerprint.as_str().to_ascii_uppercase();
        assert!(service.verify(&upper).await.unwrap().found);

        let miss = service
            .verify(Fingerprint::of(b"other").as_str())
            .await
            .unwrap();
        assert_eq!(miss, HashLookup::miss());
    }

    #[tokio::test]
    async fn test_verify_malformed_is_not_found() {
        let service = HashService::new(Arc::new(InMemoryStore::new()));
        assert!(!service.verify("not-a-digest").await.unwrap().found);
        assert!(!service.verify("").await.unwrap().found);
    }

    #[tokio::test]
    async fn test_verify_content_detects_tampering() {
        let store = Arc::new(InMemoryStore::new());
        let doc = seed_document(&store, b"original").await;
        let storage = StorageService::in_memory().unwrap();

        storage
            .write(&doc.storage_key, Bytes::from_static(b"original"))
            .await
            .unwrap();
        let report = HashService::<InMemoryStore>::verify_content(&storage, &doc)
            .await
            .unwrap();
        assert!(report.intact);

        storage
            .write(&doc.storage_key, Bytes::from_static(b"0riginal"))
            .await
            .unwrap();
        let report = HashService::<InMemoryStore>::verify_content(&storage, &doc)
            .await
            .unwrap();
        assert!(!report.intact);
        assert_eq!(report.expected, doc.fingerprint);
        assert_ne!(report.actual, doc.fingerprint);
    }
}
