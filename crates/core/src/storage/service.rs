//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};

use docseal_shared::types::DocumentId;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::integrity::Fingerprint;

/// Presigned URL for download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Storage key.
    pub storage_key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type, if the provider records one.
    pub content_type: Option<String>,
}

/// Object storage for document content.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// In-memory storage with default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be built.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_config(StorageConfig::new(StorageProvider::Memory))
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Validate an upload against size and MIME constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Storage key for a document's content.
    ///
    /// Format: `documents/{fingerprint}/{document_id}/{sanitized_filename}`
    #[must_use]
    pub fn document_key(fingerprint: &Fingerprint, document_id: DocumentId, filename: &str) -> String {
        let sanitized = sanitize_filename(filename);
        let name = if sanitized.is_empty() {
            "content"
        } else {
            sanitized.as_str()
        };
        format!("documents/{fingerprint}/{document_id}/{name}")
    }

    /// Write an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, content)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::from_opendal(&e, key))
    }

    /// Read an object in full.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        self.operator
            .read(key)
            .await
            .map(|buffer| buffer.to_bytes())
            .map_err(|e| StorageError::from_opendal(&e, key))
    }

    /// Object metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be accessed.
    pub async fn stat(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(ObjectMetadata {
            storage_key: key.to_string(),
            size_bytes: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Generate presigned URL for download.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(
                    i64::try_from(self.config.presign_download_ttl_secs).unwrap_or(i64::MAX),
                ),
        })
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("provider", &self.config.provider.name())
            .field("max_file_size", &self.config.max_file_size)
            .finish_non_exhaustive()
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("transcript.pdf"), "transcript.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_document_key() {
        let fp = Fingerprint::of(b"content");
        let id = DocumentId::new();
        let key = StorageService::document_key(&fp, id, "Final Transcript.pdf");
        assert_eq!(
            key,
            format!("documents/{fp}/{id}/Final_Transcript.pdf")
        );
        assert!(StorageService::document_key(&fp, id, "").ends_with("/content"));
    }

    #[test]
    fn test_validate_upload() {
        let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(1024);
        let service = StorageService::from_config(config).unwrap();

        assert!(service.validate_upload("application/pdf", 512).is_ok());
        assert!(matches!(
            service.validate_upload("application/pdf", 2048),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            service.validate_upload("application/x-executable", 10),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_write_read_delete() {
        let service = StorageService::in_memory().unwrap();
        let key = "documents/a/b/c.pdf";

        assert!(!service.exists(key).await);
        service.write(key, Bytes::from_static(b"%PDF-1.7")).await.unwrap();
        assert!(service.exists(key).await);
        assert_eq!(service.read(key).await.unwrap(), Bytes::from_static(b"%PDF-1.7"));
        assert_eq!(service.stat(key).await.unwrap().size_bytes, 8);

        service.delete(key).await.unwrap();
        assert!(matches!(
            service.read(key).await,
            Err(StorageError::NotFound { .. })
        ));
    }
}
