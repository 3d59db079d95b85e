//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer token authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::iter::once;
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use axum::http::header::AUTHORIZATION;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use docseal_core::audit::AuditLedger;
use docseal_core::document::DocumentService;
use docseal_core::storage::StorageService;
use docseal_core::vault::SignatureVault;
use docseal_core::verification::VerificationPortal;
use docseal_core::workflow::WorkflowEngine;
use docseal_db::{PgAuditStore, PgDocumentRepository, PgWorkflowRepository};
use docseal_shared::JwtService;

pub use error::ApiError;
pub use extractors::TrustedProxies;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Template and document registration.
    pub documents: Arc<DocumentService<PgDocumentRepository>>,
    /// Workflow advancement.
    pub workflows: Arc<WorkflowEngine<PgWorkflowRepository>>,
    /// Public hash verification.
    pub portal: Arc<VerificationPortal<PgDocumentRepository, PgAuditStore>>,
    /// Audit ledger queries.
    pub ledger: AuditLedger<PgAuditStore>,
    /// Document content storage.
    pub storage: Arc<StorageService>,
    /// Bearer token validation.
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    /// Wire every service onto one database connection.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<StorageService>,
        vault: Arc<SignatureVault>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        let document_repo = Arc::new(PgDocumentRepository::new(db.clone()));
        let workflow_repo = Arc::new(PgWorkflowRepository::new(db.clone()));
        let ledger = AuditLedger::new(Arc::new(PgAuditStore::new(db)));

        Self {
            documents: Arc::new(DocumentService::new(
                Arc::clone(&document_repo),
                Arc::clone(&storage),
            )),
            workflows: Arc::new(WorkflowEngine::new(workflow_repo, vault)),
            portal: Arc::new(VerificationPortal::new(document_repo, ledger.clone())),
            ledger,
            storage,
            jwt_service,
        }
    }
}

/// Creates the main application router.
///
/// `X-Forwarded-For` is only read from peers in `trusted_proxies`.
pub fn create_router(
    state: AppState,
    request_timeout: Duration,
    trusted_proxies: TrustedProxies,
) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(Extension(trusted_proxies))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
