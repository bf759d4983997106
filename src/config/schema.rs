//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the response store service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// HTTP surface settings.
    pub api: ApiConfig,

    /// Table storage connection settings.
    pub storage: StorageConfig,

    /// Secret store lookup for storage credentials.
    pub secrets: SecretsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path segment the record routes are mounted under (`/{resource}/{id}`).
    pub resource: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            resource: "httpresponse".to_string(),
        }
    }
}

/// Which table store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon DynamoDB (or any endpoint speaking its API).
    DynamoDb,
    /// Process-local table, contents lost on exit.
    Memory,
}

/// Table storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Storage service endpoint URI. Empty means the SDK's regional default.
    pub endpoint_uri: String,

    /// Account name (access key id).
    pub account_name: String,

    /// Account key (secret access key). Never logged.
    pub account_key: String,

    /// Region the table lives in.
    pub region: String,

    /// Name of the table holding response records.
    pub table_name: String,

    /// Partition every record row is written under.
    pub partition_key: String,

    /// Create the table at startup when it does not exist.
    pub create_table: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::DynamoDb,
            endpoint_uri: String::new(),
            account_name: String::new(),
            account_key: String::new(),
            region: "us-east-1".to_string(),
            table_name: "returnresponsetable".to_string(),
            partition_key: "responses".to_string(),
            create_table: true,
        }
    }
}

/// Secret store configuration.
///
/// When enabled, the storage endpoint and credentials are read from the
/// named secrets instead of the `storage` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub enabled: bool,

    /// Secret store endpoint override. Empty uses the SDK default.
    pub endpoint_uri: String,

    pub storage_uri_secret: String,
    pub account_name_secret: String,
    pub account_key_secret: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint_uri: String::new(),
            storage_uri_secret: "storage-uri-secret-name".to_string(),
            account_name_secret: "account-name-secret-name".to_string(),
            account_key_secret: "account-key-secret-name".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
