//! Docseal API Server
//!
//! Main entry point for the document approval and verification service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docseal_api::{AppState, TrustedProxies, create_router};
use docseal_core::storage::{StorageConfig, StorageService};
use docseal_core::vault::SignatureVault;
use docseal_db::connect_with;
use docseal_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docseal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    info!(run_mode = %config.run_mode, "Configuration loaded");

    // Signature vault; a missing key stops startup
    let vault = SignatureVault::from_config(&config.vault)
        .context("failed to initialise signature vault")?;
    if vault.is_insecure() {
        warn!("Signature vault is running in insecure development mode");
    }

    // Document storage
    let storage_config = StorageConfig::from_settings(&config.storage)
        .context("invalid storage configuration")?;
    let storage = StorageService::from_config(storage_config)
        .context("failed to initialise document storage")?;
    info!(provider = storage.provider_name(), "Storage configured");

    // Connect to database
    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let jwt_service = JwtService::new(&config.auth);

    // Create application state
    let state = AppState::new(
        db,
        Arc::new(storage),
        Arc::new(vault),
        Arc::new(jwt_service),
    );

    // Create router
    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
        TrustedProxies::new(config.server.trusted_proxies.iter().copied()),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
