//! Content fingerprints and integrity checks.
//!
//! A document's identity for third-party verification is the lowercase
//! hex SHA-256 of its bytes.

mod fingerprint;
mod service;

pub use fingerprint::{Fingerprint, InvalidFingerprint};
pub use service::{HashLookup, HashService, IntegrityReport};
