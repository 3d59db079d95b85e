//! Authenticated encryption of signature payloads at rest.
//!
//! Signature images (`data:image/...` URIs) are sealed before they are
//! persisted. Each call draws a fresh salt and IV and derives a one-off
//! AES-256-GCM key from the configured secret with Argon2id.
//!
//! # Sealed format
//!
//! ```text
//! enc:v1:<base64( salt[64] || iv[16] || tag[16] || ciphertext )>
//! ```
//!
//! Anything else is treated as legacy plaintext and passed through.

mod error;

#[cfg(test)]
mod vault_props;

use std::sync::Arc;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;
use zeroize::Zeroizing;

use docseal_shared::config::VaultConfig;

pub use error::VaultError;

/// Marker that prefixes every sealed payload.
pub const SEALED_PREFIX: &str = "enc:v1:";
/// Only payloads with this prefix are sealed.
pub const SIGNATURE_DATA_PREFIX: &str = "data:image/";
/// Salt length in bytes.
pub const SALT_LEN: usize = 64;
/// IV length in bytes.
pub const IV_LEN: usize = 16;
/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

const HEADER_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;
const INSECURE_DEV_PASSPHRASE: &[u8] = b"docseal-insecure-development-key";

type SignatureCipher = AesGcm<Aes256, U16>;

/// Seals and opens signature payloads.
pub struct SignatureVault {
    secret: Zeroizing<Vec<u8>>,
    kdf: Argon2<'static>,
    insecure: bool,
}

impl SignatureVault {
    /// Create a vault from an explicit secret and Argon2id costs.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidKdfParams` if the costs are rejected.
    pub fn new(
        secret: impl AsRef<[u8]>,
        memory_kib: u32,
        iterations: u32,
    ) -> Result<Self, VaultError> {
        let params = Params::new(memory_kib, iterations, 1, Some(KEY_LEN))
            .map_err(|e| VaultError::InvalidKdfParams(e.to_string()))?;
        Ok(Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
            kdf: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            insecure: false,
        })
    }

    /// Create a vault from startup configuration.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::MissingKey` when no key is configured and
    /// insecure development mode is off.
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        match config.key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Self::new(key, config.kdf_memory_kib, config.kdf_iterations),
            None if config.insecure_dev_mode => {
                warn!(
                    "vault.key is not set; sealing signatures with the INSECURE development \
                     fallback key. Never run this configuration with real data."
                );
                let mut vault = Self::new(
                    INSECURE_DEV_PASSPHRASE,
                    config.kdf_memory_kib,
                    config.kdf_iterations,
                )?;
                vault.insecure = true;
                Ok(vault)
            }
            None => Err(VaultError::MissingKey),
        }
    }

    /// Returns true if the vault runs on the development fallback key.
    #[must_use]
    pub const fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// Returns true if `value` carries the sealed marker.
    #[must_use]
    pub fn is_sealed(value: &str) -> bool {
        value.starts_with(SEALED_PREFIX)
    }

    /// Returns true if `value` is a payload that gets sealed.
    #[must_use]
    pub fn is_signature_payload(value: &str) -> bool {
        value.starts_with(SIGNATURE_DATA_PREFIX)
    }

    /// Seal a signature payload.
    ///
    /// Empty, already sealed, and non-image values are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation or encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        if plaintext.is_empty()
            || Self::is_sealed(plaintext)
            || !Self::is_signature_payload(plaintext)
        {
            return Ok(plaintext.to_string());
        }

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let cipher = self.cipher_for(&salt)?;
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| VaultError::Encryption)?;

        let mut packed = Vec::with_capacity(HEADER_LEN + buffer.len());
        packed.extend_from_slice(&salt);
        packed.extend_from_slice(&iv);
        packed.extend_from_slice(&tag);
        packed.extend_from_slice(&buffer);

        Ok(format!("{SEALED_PREFIX}{}", BASE64.encode(packed)))
    }

    /// Open a sealed payload.
    ///
    /// Unsealed input is returned as-is. Returns `None` when the payload
    /// is malformed or fails authentication.
    #[must_use]
    pub fn decrypt(&self, sealed: &str) -> Option<String> {
        let Some(encoded) = sealed.strip_prefix(SEALED_PREFIX) else {
            return Some(sealed.to_string());
        };

        let packed = match BASE64.decode(encoded) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "sealed signature is not valid base64");
                return None;
            }
        };
        if packed.len() < HEADER_LEN {
            warn!(len = packed.len(), "sealed signature is truncated");
            return None;
        }

        let (salt, rest) = packed.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let cipher = match self.cipher_for(salt) {
            Ok(cipher) => cipher,
            Err(e) => {
                warn!(error = %e, "could not derive signature key");
                return None;
            }
        };

        let mut buffer = ciphertext.to_vec();
        if cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(tag),
            )
            .is_err()
        {
            warn!("sealed signature failed authentication");
            return None;
        }

        match String::from_utf8(buffer) {
            Ok(plaintext) => Some(plaintext),
            Err(_) => {
                warn!("sealed signature decrypted to invalid UTF-8");
                None
            }
        }
    }

    /// [`encrypt`](Self::encrypt) on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if sealing fails or the task is cancelled.
    pub async fn seal(self: Arc<Self>, plaintext: String) -> Result<String, VaultError> {
        tokio::task::spawn_blocking(move || self.encrypt(&plaintext))
            .await
            .map_err(|e| VaultError::TaskFailed(e.to_string()))?
    }

    /// [`decrypt`](Self::decrypt) on the blocking pool.
    pub async fn open(self: Arc<Self>, sealed: String) -> Option<String> {
        match tokio::task::spawn_blocking(move || self.decrypt(&sealed)).await {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, "signature open task failed");
                None
            }
        }
    }

    fn cipher_for(&self, salt: &[u8]) -> Result<SignatureCipher, VaultError> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        self.kdf
            .hash_password_into(&self.secret, salt, &mut *key)
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
        SignatureCipher::new_from_slice(&*key).map_err(|_| VaultError::Encryption)
    }
}

impl std::fmt::Debug for SignatureVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVault")
            .field("secret", &"[hidden]")
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}
