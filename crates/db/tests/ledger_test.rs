//! Integration tests for the audit ledger and its immutability triggers.

mod common;

use std::sync::Arc;

use chrono::Utc;
use futures::TryStreamExt;
use sea_orm::ConnectionTrait;

use docseal_core::audit::{AuditEntry, AuditEntryKind, AuditFilter, AuditLedger, VerificationAttempt};
use docseal_core::verification::{RequestMetadata, VerificationPortal};
use docseal_db::{PgAuditStore, PgDocumentRepository};
use docseal_shared::types::AttemptId;

fn attempt(fingerprint: &str) -> AuditEntry {
    AuditEntry::VerificationAttempt(VerificationAttempt {
        id: AttemptId::new(),
        fingerprint: fingerprint.to_string(),
        matched: false,
        document_id: None,
        ip_address: None,
        user_agent: None,
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn test_appends_are_strictly_ordered_and_pageable() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = AuditLedger::new(Arc::new(PgAuditStore::new(db.clone()))).with_page_size(2);

    let mut sequences = Vec::new();
    for i in 0..5 {
        sequences.push(ledger.append(attempt(&format!("page-{i}"))).await.unwrap().sequence);
    }
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));

    let after = sequences[0] - 1;
    let streamed: Vec<_> = ledger
        .query_after(
            AuditFilter::all().of_kind(AuditEntryKind::VerificationAttempt),
            Some(after),
        )
        .try_collect()
        .await
        .unwrap();
    let streamed: Vec<i64> = streamed
        .iter()
        .map(|r| r.sequence)
        .filter(|s| sequences.contains(s))
        .collect();
    assert_eq!(streamed, sequences);
}

#[tokio::test]
async fn test_ledger_rows_cannot_be_updated_or_deleted() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = AuditLedger::new(Arc::new(PgAuditStore::new(db.clone())));
    let record = ledger.append(attempt("immutable")).await.unwrap();

    let update = db
        .execute_unprepared(&format!(
            "UPDATE audit_entries SET kind = 'document_created' WHERE sequence = {}",
            record.sequence
        ))
        .await;
    assert!(update.is_err());

    let delete = db
        .execute_unprepared(&format!(
            "DELETE FROM audit_entries WHERE sequence = {}",
            record.sequence
        ))
        .await;
    assert!(delete.is_err());
}

#[tokio::test]
async fn test_verification_attempts_are_recorded() {
    let Some(db) = common::connect().await else {
        return;
    };
    let documents = common::documents(&db);
    let registration =
        common::register(&documents, &["registrar"], common::unique_content("verify")).await;

    let store = Arc::new(PgAuditStore::new(db.clone()));
    let portal = VerificationPortal::new(
        Arc::new(PgDocumentRepository::new(db.clone())),
        AuditLedger::new(Arc::clone(&store)),
    );

    let result = portal
        .check_hash(
            registration.document.fingerprint.as_str(),
            RequestMetadata::default(),
        )
        .await
        .unwrap();
    assert!(result.is_verified);

    let recorded = AuditLedger::new(store)
        .collect(
            AuditFilter::all()
                .for_document(registration.document.id)
                .of_kind(AuditEntryKind::VerificationAttempt),
        )
        .await
        .unwrap();
    assert_eq!(recorded.len(), 1);
}
