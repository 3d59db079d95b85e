//! Object storage for document content using Apache OpenDAL.
//!
//! Supported providers:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, MinIO
//! - Azure Blob Storage
//! - Local filesystem (development)
//! - In-memory (tests)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Apache OpenDAL                         │
//! ├────────────────────────────────────────────────────────────┤
//! │ op.write(key, bytes)   │ op.presign_read(key, ttl)         │
//! │ op.read(key)           │ op.stat(key)                      │
//! │ op.delete(key)         │                                   │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ObjectMetadata, PresignedUrl, StorageService};
