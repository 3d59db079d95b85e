//! Application configuration management.

use std::net::IpAddr;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Run mode in which the insecure vault fallback is refused outright.
pub const PRODUCTION_RUN_MODE: &str = "production";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Run mode (`RUN_MODE`), e.g. `development` or `production`.
    /// Unset means production.
    #[serde(default = "default_run_mode")]
    pub run_mode: String,
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bearer token configuration.
    pub auth: AuthConfig,
    /// Signature vault configuration.
    #[serde(default)]
    pub vault: VaultConfig,
    /// Document object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_run_mode() -> String {
    PRODUCTION_RUN_MODE.to_string()
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Reverse proxies whose `X-Forwarded-For` header is believed.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret used by the identity provider.
    pub jwt_secret: String,
    /// Lifetime of tokens issued by operator tooling, in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

fn default_token_ttl() -> i64 {
    15
}

/// Signature vault configuration.
///
/// The key is injected at startup. Leaving it unset is only accepted when
/// `insecure_dev_mode` is explicitly enabled.
#[derive(Clone, Deserialize)]
pub struct VaultConfig {
    /// Secret the per-signature keys are derived from.
    #[serde(default)]
    pub key: Option<String>,
    /// Allow the deterministic development fallback key.
    #[serde(default)]
    pub insecure_dev_mode: bool,
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_memory_kib")]
    pub kdf_memory_kib: u32,
    /// Argon2id iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

fn default_kdf_memory_kib() -> u32 {
    19 * 1024
}

fn default_kdf_iterations() -> u32 {
    2
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key: None,
            insecure_dev_mode: false,
            kdf_memory_kib: default_kdf_memory_kib(),
            kdf_iterations: default_kdf_iterations(),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("key", &self.key.as_ref().map(|_| "[hidden]"))
            .field("insecure_dev_mode", &self.insecure_dev_mode)
            .field("kdf_memory_kib", &self.kdf_memory_kib)
            .field("kdf_iterations", &self.kdf_iterations)
            .finish()
    }
}

/// Object storage settings for document bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider: `local`, `s3`, `azure_blob` or `memory`.
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// Root directory for the `local` provider.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Endpoint URL for `s3`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bucket (`s3`) or container (`azure_blob`).
    #[serde(default)]
    pub bucket: Option<String>,
    /// Region for `s3`.
    #[serde(default)]
    pub region: Option<String>,
    /// Access key id (`s3`) or account name (`azure_blob`).
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key (`s3`) or account key (`azure_blob`).
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Maximum document size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_storage_provider() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "./storage".to_string()
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            root: default_storage_root(),
            endpoint: None,
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            max_file_size: default_max_file_size(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is unsafe for
    /// the current run mode.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| default_run_mode());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DOCSEAL").separator("__"))
            .set_override("run_mode", run_mode)
            .and_then(|builder| builder.build())
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns true when running in production posture.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.run_mode.eq_ignore_ascii_case(PRODUCTION_RUN_MODE)
    }

    /// Rejects combinations that must never reach a production deployment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` describing the offending setting.
    pub fn validate(&self) -> AppResult<()> {
        if self.is_production() && self.vault.insecure_dev_mode {
            return Err(AppError::Configuration(
                "vault.insecure_dev_mode requires RUN_MODE to name a non-production mode"
                    .to_string(),
            ));
        }
        if self.vault.key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(AppError::Configuration(
                "vault.key is set but empty".to_string(),
            ));
        }
        Ok(())
    }
}
