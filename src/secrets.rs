//! Named secret lookup.
//!
//! The bootstrap resolves the storage endpoint and credentials through a
//! [`SecretStore`] when `secrets.enabled` is set.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use thiserror::Error;

use crate::config::SecretsConfig;

/// Errors from a secret lookup.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    NotFound(String),

    #[error("secret '{0}' has no string value")]
    NotText(String),

    #[error("secret store error for '{name}': {message}")]
    Backend { name: String, message: String },
}

/// A source of named string secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}

/// AWS Secrets Manager, using the ambient credential chain.
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Build a client from the default provider chain, honoring the endpoint override.
    pub async fn from_config(config: &SecretsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if !config.endpoint_uri.is_empty() {
            loader = loader.endpoint_url(&config.endpoint_uri);
        }
        let sdk_config = loader.load().await;

        Self::new(aws_sdk_secretsmanager::Client::new(&sdk_config))
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    SecretError::NotFound(name.to_string())
                } else {
                    SecretError::Backend {
                        name: name.to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    }
                }
            })?;

        output
            .secret_string
            .ok_or_else(|| SecretError::NotText(name.to_string()))
    }
}

/// Fixed secrets held in memory. Useful for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new<I, K, V>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: secrets
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::operation::get_secret_value::{
        GetSecretValueError, GetSecretValueOutput,
    };
    use aws_sdk_secretsmanager::types::error::ResourceNotFoundException;
    use aws_smithy_mocks::{mock, mock_client};

    #[tokio::test]
    async fn test_static_lookup() {
        let store = StaticSecretStore::new([("account-name-secret-name", "acct")]);
        assert_eq!(store.get_secret("account-name-secret-name").await.unwrap(), "acct");
        assert!(matches!(
            store.get_secret("other").await,
            Err(SecretError::NotFound(name)) if name == "other"
        ));
    }

    #[tokio::test]
    async fn test_secrets_manager_value() {
        let rule = mock!(aws_sdk_secretsmanager::Client::get_secret_value)
            .match_requests(|req| req.secret_id() == Some("storage-uri-secret-name"))
            .then_output(|| {
                GetSecretValueOutput::builder()
                    .secret_string("http://localhost:8000")
                    .build()
            });
        let client = mock_client!(aws_sdk_secretsmanager, [&rule]);

        let store = SecretsManagerStore::new(client);
        let value = store.get_secret("storage-uri-secret-name").await.unwrap();
        assert_eq!(value, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_secrets_manager_missing() {
        let rule = mock!(aws_sdk_secretsmanager::Client::get_secret_value).then_error(|| {
            GetSecretValueError::ResourceNotFoundException(
                ResourceNotFoundException::builder().build(),
            )
        });
        let client = mock_client!(aws_sdk_secretsmanager, [&rule]);

        let store = SecretsManagerStore::new(client);
        let err = store.get_secret("account-key-secret-name").await.unwrap_err();
        assert_eq!(err.to_string(), "secret 'account-key-secret-name' not found");
    }
}
