//! Append-only audit ledger of workflow actions, document registrations
//! and verification attempts.
//!
//! There is no update or delete path. Queries stream records lazily in
//! ledger order, one page at a time.

pub mod error;
pub mod ledger;
pub mod types;

pub use error::AuditError;
pub use ledger::{AuditLedger, AuditStore};
pub use types::{
    AuditEntry, AuditEntryKind, AuditFilter, AuditRecord, DocumentCreated, VerificationAttempt,
};
