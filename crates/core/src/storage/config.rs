//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use docseal_shared::config::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, MinIO
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Storage access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory (tests only)
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name as used in configuration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Presigned download URL TTL in seconds.
    pub presign_download_ttl_secs: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 20MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;
    /// Default download TTL: 15 minutes.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 900;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Build from the `storage` section of the application config.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` for an unknown provider or a
    /// provider missing required settings.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, StorageError> {
            value
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::configuration(format!("storage.{name} is required")))
        }

        let provider = match settings.provider.as_str() {
            "local" => StorageProvider::local_fs(&settings.root),
            "memory" => StorageProvider::Memory,
            "s3" => StorageProvider::s3(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.bucket.as_ref(), "bucket")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                settings.region.as_deref().unwrap_or("auto"),
            ),
            "azure_blob" => StorageProvider::azure_blob(
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                required(settings.bucket.as_ref(), "bucket")?,
            ),
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        Ok(Self::new(provider).with_max_file_size(settings.max_file_size))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Set allowed MIME types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Default allowed MIME types for documents.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "application/pdf".to_string(),
            "application/msword".to_string(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
            "text/plain".to_string(),
            "image/png".to_string(),
            "image/jpeg".to_string(),
        ]
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_local_default() {
        let config = StorageConfig::from_settings(&StorageSettings::default()).unwrap();
        assert_eq!(config.provider.name(), "local");
        assert_eq!(config.max_file_size, 20 * 1024 * 1024);
    }

    #[test]
    fn test_from_settings_s3_requires_bucket() {
        let settings = StorageSettings {
            provider: "s3".to_string(),
            endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("storage.bucket"));
    }

    #[test]
    fn test_from_settings_s3() {
        let settings = StorageSettings {
            provider: "s3".to_string(),
            endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
            bucket: Some("documents".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..StorageSettings::default()
        };
        let config = StorageConfig::from_settings(&settings).unwrap();
        match config.provider {
            StorageProvider::S3 { bucket, region, .. } => {
                assert_eq!(bucket, "documents");
                assert_eq!(region, "auto");
            }
            other => panic!("expected s3, got {other:?}"),
        }
    }

    #[test]
    fn test_from_settings_unknown_provider() {
        let settings = StorageSettings {
            provider: "ftp".to_string(),
            ..StorageSettings::default()
        };
        assert!(matches!(
            StorageConfig::from_settings(&settings),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_mime_type_validation() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(config.is_mime_type_allowed("text/plain; charset=utf-8"));
        assert!(!config.is_mime_type_allowed("application/x-executable"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }
}
