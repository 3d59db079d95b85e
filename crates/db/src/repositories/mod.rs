//! Repository implementations for data access.
//!
//! Each repository implements one of the core repository traits on top of
//! a `SeaORM` connection, hiding the SQL from the domain layer.

pub mod audit;
pub mod document;
pub mod workflow;

pub use audit::PgAuditStore;
pub use document::PgDocumentRepository;
pub use workflow::PgWorkflowRepository;
