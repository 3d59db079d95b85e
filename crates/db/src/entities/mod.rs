//! `SeaORM` entity definitions.

pub mod audit_entries;
pub mod document_templates;
pub mod documents;
pub mod workflow_actions;
pub mod workflows;
