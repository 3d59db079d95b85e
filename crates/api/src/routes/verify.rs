//! Public verification endpoints.
//!
//! Anyone may ask whether a digest or a file is registered. Every query is
//! recorded in the audit ledger before it is answered.

use axum::{Json, Router, extract::State, routing::post};
use bytes::Bytes;
use serde::Deserialize;

use docseal_core::verification::VerificationResult;

use crate::{AppState, error::ApiError, extractors::ClientMetadata};

/// Creates the verification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/verify", post(verify_hash))
        .route("/verify/content", post(verify_content))
}

/// Request body for digest verification.
#[derive(Debug, Deserialize)]
pub struct VerifyHashRequest {
    /// Hex SHA-256 digest, either case.
    pub hash: String,
}

/// POST `/verify`
async fn verify_hash(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    Json(payload): Json<VerifyHashRequest>,
) -> Result<Json<VerificationResult>, ApiError> {
    let result = state.portal.check_hash(&payload.hash, metadata).await?;
    Ok(Json(result))
}

/// POST `/verify/content` with the raw file as body.
///
/// An empty body is checked like any other content; it can never match a
/// registered document.
async fn verify_content(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    body: Bytes,
) -> Result<Json<VerificationResult>, ApiError> {
    let result = state.portal.check_content(&body, metadata).await?;
    Ok(Json(result))
}
