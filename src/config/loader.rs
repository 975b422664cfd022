//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::LedgerConfig;
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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<LedgerConfig, ConfigError> {
    let config: LedgerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LedgerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [network]
            name = "anvil"
            chain_id = 31337
            rpc_urls = ["http://localhost:8545", "https://YOUR_BACKUP_RPC"]

            [contracts]
            loan_registry = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

            [retries]
            max_attempts = 3
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.network.name, "anvil");
        assert_eq!(config.retries.max_attempts, 3);
        assert_eq!(config.network.rpc_urls.len(), 2);
    }

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = parse_config(
            r#"
            [network]
            chain_id = 0
            rpc_urls = []
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed"));
        assert!(message.contains("network.chain_id"));
        assert!(message.contains("network.rpc_urls"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/ledger.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
