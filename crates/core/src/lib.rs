//! Core domain logic for Docseal.
//!
//! This crate contains pure domain logic with ZERO web or database
//! dependencies. Persistence is reached through the repository traits each
//! module defines.
//!
//! # Modules
//!
//! - `workflow` - Role-gated, linear approval state machine
//! - `document` - Templates and document registration
//! - `integrity` - Content fingerprints and hash lookup
//! - `vault` - Authenticated encryption of signature payloads
//! - `audit` - Append-only audit ledger
//! - `verification` - Public verification portal
//! - `storage` - Object storage for document content

pub mod audit;
pub mod document;
pub mod integrity;
pub mod storage;
pub mod vault;
pub mod verification;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
