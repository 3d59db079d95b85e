//! Shared types, errors, and configuration for Docseal.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Bearer token validation for externally issued access tokens

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod error_tests;

pub use auth::Claims;
pub use config::{AppConfig, AuthConfig, StorageSettings, VaultConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
