//! Documents, templates and registration.
//!
//! A document is identified by the fingerprint of its content and owns
//! exactly one approval workflow, created from a template when the
//! document is registered.

pub mod error;
pub mod service;
pub mod types;

pub use error::DocumentError;
pub use service::{DocumentRepository, DocumentService, Registration};
pub use types::{
    CreateTemplate, Document, DocumentStatus, DocumentSummary, DocumentTemplate, RegisterDocument,
};
