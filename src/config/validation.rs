//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URIs and names before anything is bound or dialed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, StorageBackend};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid URI")]
    InvalidUri { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("api.resource: '{0}' must be a single path segment")]
    InvalidResource(String),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        &mut errors,
        "listener.bind_address",
        &config.listener.bind_address,
    );
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let resource = &config.api.resource;
    if resource.is_empty() || resource.contains('/') || resource.contains('{') {
        errors.push(ValidationError::InvalidResource(resource.clone()));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let storage = &config.storage;
    if storage.partition_key.is_empty() {
        errors.push(ValidationError::Empty {
            field: "storage.partition_key",
        });
    }

    if storage.backend == StorageBackend::DynamoDb {
        check_non_empty(&mut errors, "storage.table_name", &storage.table_name);
        check_non_empty(&mut errors, "storage.region", &storage.region);

        // Credentials come from the secret store when it is enabled.
        if config.secrets.enabled {
            let secrets = &config.secrets;
            check_non_empty(&mut errors, "secrets.storage_uri_secret", &secrets.storage_uri_secret);
            check_non_empty(&mut errors, "secrets.account_name_secret", &secrets.account_name_secret);
            check_non_empty(&mut errors, "secrets.account_key_secret", &secrets.account_key_secret);
            check_optional_uri(&mut errors, "secrets.endpoint_uri", &secrets.endpoint_uri);
        } else {
            check_optional_uri(&mut errors, "storage.endpoint_uri", &storage.endpoint_uri);
            check_non_empty(&mut errors, "storage.account_name", &storage.account_name);
            check_non_empty(&mut errors, "storage.account_key", &storage.account_key);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an endpoint URI. Used for values resolved after config load too.
pub fn check_uri(field: &'static str, value: &str) -> Result<(), ValidationError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUri {
            field,
            value: value.to_string(),
        })
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_optional_uri(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        return;
    }
    if let Err(e) = check_uri(field, value) {
        errors.push(e);
    }
}

fn check_non_empty(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Empty { field });
    }
}
