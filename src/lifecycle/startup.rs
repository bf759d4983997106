//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve storage endpoint and credentials (secret store or config)
//! - Construct the table store once and make sure its table exists
//! - Wire the store into the response service and build the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound by the caller, after bootstrap succeeds

use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::check_uri;
use crate::config::{ConfigError, ServiceConfig, StorageBackend, ValidationError};
use crate::http::HttpServer;
use crate::secrets::{SecretError, SecretStore, SecretsManagerStore};
use crate::service::ResponseService;
use crate::store::dynamodb::ConnectionSettings;
use crate::store::{DynamoDbTableStore, InMemoryTableStore, StoreError, TableStore};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("secret lookup failed: {0}")]
    Secret(#[from] SecretError),

    #[error("invalid resolved setting: {0}")]
    Validation(#[from] ValidationError),

    #[error("table store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Work out where the table service lives and which credentials to use.
///
/// With `secrets` present the endpoint, account name and account key are
/// looked up by the configured secret names. Otherwise the `storage` section
/// supplies them directly.
pub async fn resolve_connection(
    config: &ServiceConfig,
    secrets: Option<&dyn SecretStore>,
) -> Result<ConnectionSettings, StartupError> {
    let storage = &config.storage;

    let (endpoint_uri, account_name, account_key) = match secrets {
        Some(store) => {
            let names = &config.secrets;
            tracing::info!(
                storage_uri_secret = %names.storage_uri_secret,
                account_name_secret = %names.account_name_secret,
                "Resolving storage settings from secret store"
            );
            (
                store.get_secret(&names.storage_uri_secret).await?,
                store.get_secret(&names.account_name_secret).await?,
                store.get_secret(&names.account_key_secret).await?,
            )
        }
        None => (
            storage.endpoint_uri.clone(),
            storage.account_name.clone(),
            storage.account_key.clone(),
        ),
    };

    let endpoint_uri = match endpoint_uri.trim() {
        "" => None,
        uri => {
            check_uri("storage.endpoint_uri", uri)?;
            Some(uri.to_string())
        }
    };

    Ok(ConnectionSettings {
        endpoint_uri,
        account_name,
        account_key,
        region: storage.region.clone(),
    })
}

/// Construct the configured table store and, if enabled, create its table.
pub async fn build_store(
    config: &ServiceConfig,
    secrets: Option<&dyn SecretStore>,
) -> Result<Arc<dyn TableStore>, StartupError> {
    let store: Arc<dyn TableStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory table store; records are lost on exit");
            Arc::new(InMemoryTableStore::new())
        }
        StorageBackend::DynamoDb => {
            let settings = resolve_connection(config, secrets).await?;
            let store = DynamoDbTableStore::new(settings.client(), config.storage.table_name.clone());
            tracing::info!(
                table = %store.table_name(),
                region = %settings.region,
                endpoint = settings.endpoint_uri.as_deref().unwrap_or("default"),
                "Connecting to DynamoDB"
            );
            Arc::new(store)
        }
    };

    if config.storage.create_table {
        store.ensure_table().await?;
    }

    Ok(store)
}

/// Build the HTTP server, fetching secrets from AWS Secrets Manager when enabled.
pub async fn bootstrap(config: ServiceConfig) -> Result<HttpServer, StartupError> {
    let uses_secrets =
        config.secrets.enabled && config.storage.backend == StorageBackend::DynamoDb;

    if uses_secrets {
        let secrets = SecretsManagerStore::from_config(&config.secrets).await;
        bootstrap_with(config, Some(&secrets)).await
    } else {
        bootstrap_with(config, None).await
    }
}

/// Build the HTTP server with an explicit secret source.
pub async fn bootstrap_with(
    config: ServiceConfig,
    secrets: Option<&dyn SecretStore>,
) -> Result<HttpServer, StartupError> {
    let store = build_store(&config, secrets).await?;
    let service = ResponseService::new(store, config.storage.partition_key.clone());

    tracing::info!(
        resource = %config.api.resource,
        partition_key = %config.storage.partition_key,
        "Response service ready"
    );

    Ok(HttpServer::new(config, service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretStore;

    fn secrets() -> StaticSecretStore {
        StaticSecretStore::new([
            ("storage-uri-secret-name", "http://localhost:8000"),
            ("account-name-secret-name", "local"),
            ("account-key-secret-name", "s3cr3t"),
        ])
    }

    #[tokio::test]
    async fn test_resolve_from_secrets() {
        let config = ServiceConfig::default();
        let store = secrets();

        let settings = resolve_connection(&config, Some(&store)).await.unwrap();
        assert_eq!(settings.endpoint_uri.as_deref(), Some("http://localhost:8000"));
        assert_eq!(settings.account_name, "local");
        assert_eq!(settings.account_key, "s3cr3t");
        assert_eq!(settings.region, "us-east-1");
    }

    #[tokio::test]
    async fn test_resolve_from_config() {
        let mut config = ServiceConfig::default();
        config.storage.account_name = "name".to_string();
        config.storage.account_key = "key".to_string();

        let settings = resolve_connection(&config, None).await.unwrap();
        assert_eq!(settings.endpoint_uri, None);
        assert_eq!(settings.account_name, "name");
        assert!(!format!("{:?}", settings).contains("\"key\""));
    }

    #[tokio::test]
    async fn test_missing_secret_is_fatal() {
        let config = ServiceConfig::default();
        let store = StaticSecretStore::new([("storage-uri-secret-name", "http://localhost:8000")]);

        let err = resolve_connection(&config, Some(&store)).await.unwrap_err();
        assert!(matches!(err, StartupError::Secret(SecretError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_resolved_endpoint_is_fatal() {
        let config = ServiceConfig::default();
        let store = StaticSecretStore::new([
            ("storage-uri-secret-name", "not a uri"),
            ("account-name-secret-name", "local"),
            ("account-key-secret-name", "s3cr3t"),
        ]);

        let err = resolve_connection(&config, Some(&store)).await.unwrap_err();
        assert!(matches!(err, StartupError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_memory_backend() {
        let mut config = ServiceConfig::default();
        config.storage.backend = StorageBackend::Memory;

        let server = bootstrap(config).await.unwrap();
        assert_eq!(server.config().storage.backend, StorageBackend::Memory);
    }
}
