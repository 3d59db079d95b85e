//! Audit ledger error types.

use thiserror::Error;

/// Errors raised by the audit ledger.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store failed.
    #[error("audit storage error: {0}")]
    Storage(String),

    /// An entry could not be encoded or decoded.
    #[error("audit serialization error: {0}")]
    Serialization(String),
}

impl AuditError {
    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

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

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
