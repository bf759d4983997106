//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StorageBackend;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [api]
            resource = "responses"

            [storage]
            backend = "dynamodb"
            endpoint_uri = "http://localhost:8000"
            account_name = "local"
            account_key = "local"
            table_name = "responses"

            [observability]
            log_level = "debug"
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.api.resource, "responses");
        assert_eq!(config.storage.backend, StorageBackend::DynamoDb);
        assert_eq!(config.storage.endpoint_uri, "http://localhost:8000");
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [storage]
            backend = "memory"
            partition_key = ""

            [security]
            max_body_size = 0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("storage.partition_key must not be empty"));
        assert!(message.contains("max_body_size"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_example_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("return-response.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.api.resource, "httpresponse");
        assert_eq!(config.storage.table_name, "returnresponsetable");
    }
}
