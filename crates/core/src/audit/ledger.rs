//! Append-only audit ledger.

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::audit::error::AuditError;
use crate::audit::types::{AuditEntry, AuditFilter, AuditRecord};

/// Backing store for ledger entries.
///
/// Stores only ever append. Records come back in ascending `sequence`
/// order and sequences are never reused.
pub trait AuditStore: Send + Sync {
    /// Append an entry and return it with its assigned sequence.
    fn append(
        &self,
        entry: AuditEntry,
    ) -> impl std::future::Future<Output = Result<AuditRecord, AuditError>> + Send;

    /// Up to `limit` matching records with `sequence > after`, ascending.
    fn scan(
        &self,
        filter: &AuditFilter,
        after: Option<i64>,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<AuditRecord>, AuditError>> + Send;
}

/// Ledger facade over an [`AuditStore`].
pub struct AuditLedger<S: AuditStore> {
    store: Arc<S>,
    page_size: u64,
}

impl<S: AuditStore + 'static> AuditLedger<S> {
    /// Default number of records fetched per page.
    pub const DEFAULT_PAGE_SIZE: u64 = 100;

    /// Create a ledger with the default page size.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used by [`query`](Self::query).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub async fn append(&self, entry: AuditEntry) -> Result<AuditRecord, AuditError> {
        let record = self.store.append(entry).await?;
        debug!(
            sequence = record.sequence,
            kind = %record.entry.kind(),
            "audit entry appended"
        );
        Ok(record)
    }

    /// Lazily stream every matching record in ledger order.
    pub fn query(
        &self,
        filter: AuditFilter,
    ) -> impl Stream<Item = Result<AuditRecord, AuditError>> + Send + 'static {
        self.query_after(filter, None)
    }

    /// Like [`query`](Self::query), resuming after a known sequence.
    pub fn query_after(
        &self,
        filter: AuditFilter,
        after: Option<i64>,
    ) -> impl Stream<Item = Result<AuditRecord, AuditError>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let page_size = self.page_size;

        stream::try_unfold(PageCursor::Next(after), move |cursor| {
            next_page(Arc::clone(&store), filter.clone(), cursor, page_size)
        })
        .try_flatten()
    }

    /// Collect every matching record.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn collect(&self, filter: AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        self.query(filter).try_collect().await
    }
}

impl<S: AuditStore> Clone for AuditLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PageCursor {
    Next(Option<i64>),
    Exhausted,
}

type Page = stream::Iter<std::vec::IntoIter<Result<AuditRecord, AuditError>>>;

async fn next_page<S: AuditStore>(
    store: Arc<S>,
    filter: AuditFilter,
    cursor: PageCursor,
    page_size: u64,
) -> Result<Option<(Page, PageCursor)>, AuditError> {
    let PageCursor::Next(after) = cursor else {
        return Ok(None);
    };

    let records = store.scan(&filter, after, page_size).await?;
    let Some(last) = records.last().map(|r| r.sequence) else {
        return Ok(None);
    };

    let next = if (records.len() as u64) < page_size {
        PageCursor::Exhausted
    } else {
        PageCursor::Next(Some(last))
    };

    let page: Vec<Result<AuditRecord, AuditError>> = records.into_iter().map(Ok).collect();
    Ok(Some((stream::iter(page), next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{AuditEntryKind, VerificationAttempt};
    use crate::testing::InMemoryStore;
    use chrono::Utc;
    use docseal_shared::types::{AttemptId, DocumentId};
    use futures::StreamExt;

    fn attempt(n: usize, document_id: Option<DocumentId>) -> AuditEntry {
        AuditEntry::VerificationAttempt(VerificationAttempt {
            id: AttemptId::new(),
            fingerprint: format!("{n:064x}"),
            matched: document_id.is_some(),
            document_id,
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: None,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_sequences() {
        let ledger = AuditLedger::new(Arc::new(InMemoryStore::new()));
        let a = ledger.append(attempt(1, None)).await.unwrap();
        let b = ledger.append(attempt(2, None)).await.unwrap();
        assert!(b.sequence > a.sequence);
    }

    #[tokio::test]
    async fn test_query_pages_through_everything_in_order() {
        let ledger = AuditLedger::new(Arc::new(InMemoryStore::new())).with_page_size(3);
        for n in 0..10 {
            ledger.append(attempt(n, None)).await.unwrap();
        }

        let records = ledger.collect(AuditFilter::all()).await.unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[tokio::test]
    async fn test_query_filters() {
        let ledger = AuditLedger::new(Arc::new(InMemoryStore::new())).with_page_size(2);
        let doc = DocumentId::new();
        for n in 0..6 {
            let matched = (n % 2 == 0).then_some(doc);
            ledger.append(attempt(n, matched)).await.unwrap();
        }

        let for_doc = ledger
            .collect(AuditFilter::all().for_document(doc))
            .await
            .unwrap();
        assert_eq!(for_doc.len(), 3);

        let none = ledger
            .collect(AuditFilter::all().of_kind(AuditEntryKind::WorkflowAction))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_query_is_lazy_and_restartable() {
        let ledger = AuditLedger::new(Arc::new(InMemoryStore::new())).with_page_size(2);
        for n in 0..5 {
            ledger.append(attempt(n, None)).await.unwrap();
        }

        let first_two: Vec<_> = ledger
            .query(AuditFilter::all())
            .take(2)
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(first_two.len(), 2);

        let rest = ledger
            .query_after(AuditFilter::all(), Some(first_two[1].sequence))
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest[0].sequence > first_two[1].sequence);

        let again = ledger.collect(AuditFilter::all()).await.unwrap();
        assert_eq!(again.len(), 5);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_audit_appends(true);
        let ledger = AuditLedger::new(Arc::clone(&store));
        assert!(matches!(
            ledger.append(attempt(0, None)).await,
            Err(AuditError::Storage(_))
        ));
    }
}
