//! Shared setup for database integration tests.
//!
//! Tests connect to `DATABASE_URL` and return early when it is unset, so
//! `cargo test` stays green on machines without Postgres.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;

use docseal_core::document::{CreateTemplate, DocumentService, RegisterDocument, Registration};
use docseal_core::storage::StorageService;
use docseal_core::vault::SignatureVault;
use docseal_db::PgDocumentRepository;
use docseal_db::migration::Migrator;
use docseal_shared::types::UserId;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connect and migrate, or `None` when no database is configured.
pub async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("Failed to run migrations");
        })
        .await;
    Some(db)
}

pub fn fast_vault() -> Arc<SignatureVault> {
    Arc::new(SignatureVault::new("integration-test-key", 64, 1).expect("vault"))
}

pub fn documents(db: &DatabaseConnection) -> DocumentService<PgDocumentRepository> {
    DocumentService::new(
        Arc::new(PgDocumentRepository::new(db.clone())),
        Arc::new(StorageService::in_memory().expect("memory storage")),
    )
}

/// Content unique to this call, so tests never collide on fingerprints.
pub fn unique_content(label: &str) -> Bytes {
    Bytes::from(format!("{label}-{}", uuid::Uuid::now_v7()))
}

/// Register fresh content routed through `roles`.
pub async fn register(
    service: &DocumentService<PgDocumentRepository>,
    roles: &[&str],
    content: Bytes,
) -> Registration {
    let template = service
        .create_template(CreateTemplate {
            name: "Integration".to_string(),
            document_type: "transcript".to_string(),
            approval_path: roles.iter().map(|r| (*r).to_string()).collect(),
        })
        .await
        .expect("Failed to create template");

    service
        .register(RegisterDocument {
            owner_id: UserId::new(),
            template_id: template.id,
            title: "Integration document".to_string(),
            filename: "document.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content,
        })
        .await
        .expect("Failed to register document")
}
