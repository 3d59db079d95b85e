//! Signature vault error types.

use thiserror::Error;

/// Errors raised while provisioning the vault or sealing a payload.
///
/// Opening a sealed payload never fails with an error; it yields `None`.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No key configured and insecure development mode is off.
    #[error("vault key is not configured; set vault.key or enable vault.insecure_dev_mode")]
    MissingKey,

    /// Key derivation parameters were rejected.
    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(String),

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Authenticated encryption failed.
    #[error("encryption failed")]
    Encryption,

    /// Blocking crypto task did not complete.
    #[error("vault task failed: {0}")]
    TaskFailed(String),
}

impl VaultError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingKey | Self::InvalidKdfParams(_) => "VAULT_MISCONFIGURED",
            Self::KeyDerivation(_) | Self::Encryption | Self::TaskFailed(_) => "INTERNAL_ERROR",
        }
    }
}
