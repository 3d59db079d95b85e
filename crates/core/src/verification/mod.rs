//! Public, unauthenticated document verification.
//!
//! Every query is recorded in the audit ledger, matched or not, and the
//! response never reveals who owns a document or what it contains.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use docseal_shared::types::AttemptId;

use crate::audit::{AuditEntry, AuditError, AuditLedger, AuditStore, VerificationAttempt};
use crate::document::{DocumentRepository, DocumentStatus};
use crate::integrity::{Fingerprint, HashService};

/// Longest digest string kept in the ledger.
pub const MAX_RECORDED_DIGEST_LEN: usize = 256;

/// Caller details recorded with each attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Response to a verification query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Whether a registered document matched.
    pub is_verified: bool,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
    /// Status of the matched document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_status: Option<DocumentStatus>,
    /// When the matched document was registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
}

/// Errors raised by the portal.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Document lookup failed.
    #[error("verification lookup failed: {0}")]
    Lookup(String),

    /// The attempt could not be recorded.
    #[error(transparent)]
    Ledger(#[from] AuditError),
}

impl VerificationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        500
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "INTERNAL_ERROR"
    }
}

/// Hash verification with mandatory audit logging.
pub struct VerificationPortal<R: DocumentRepository, S: AuditStore + 'static> {
    hashes: HashService<R>,
    ledger: AuditLedger<S>,
}

impl<R: DocumentRepository, S: AuditStore + 'static> VerificationPortal<R, S> {
    /// Create a portal.
    #[must_use]
    pub fn new(documents: Arc<R>, ledger: AuditLedger<S>) -> Self {
        Self {
            hashes: HashService::new(documents),
            ledger,
        }
    }

    /// Check a caller-supplied hex digest.
    ///
    /// Malformed digests are unverified but still recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the attempt cannot be
    /// recorded; no result is returned without a ledger entry.
    pub async fn check_hash(
        &self,
        raw: &str,
        metadata: RequestMetadata,
    ) -> Result<VerificationResult, VerificationError> {
        let document = match Fingerprint::parse(raw) {
            Ok(fingerprint) => self
                .hashes
                .lookup(&fingerprint)
                .await
                .map_err(|e| VerificationError::Lookup(e.to_string()))?,
            Err(_) => None,
        };

        let checked_at = Utc::now();
        let attempt = VerificationAttempt {
            id: AttemptId::new(),
            fingerprint: recorded_digest(raw),
            matched: document.is_some(),
            document_id: document.as_ref().map(|d| d.id),
            ip_address: metadata.ip_address,
            user_agent: metadata.user_agent,
            created_at: checked_at,
        };
        let record = self
            .ledger
            .append(AuditEntry::VerificationAttempt(attempt))
            .await?;

        info!(
            matched = document.is_some(),
            ledger_sequence = record.sequence,
            "Verification attempt recorded"
        );

        Ok(VerificationResult {
            is_verified: document.is_some(),
            checked_at,
            document_status: document.as_ref().map(|d| d.status),
            registered_at: document.as_ref().map(|d| d.created_at),
        })
    }

    /// Hash uploaded bytes and check the resulting fingerprint.
    ///
    /// # Errors
    ///
    /// Same as [`check_hash`](Self::check_hash).
    pub async fn check_content(
        &self,
        content: &[u8],
        metadata: RequestMetadata,
    ) -> Result<VerificationResult, VerificationError> {
        let fingerprint = HashService::<R>::fingerprint(content);
        self.check_hash(fingerprint.as_str(), metadata).await
    }
}

fn recorded_digest(raw: &str) -> String {
    raw.trim().chars().take(MAX_RECORDED_DIGEST_LEN).collect()
}
