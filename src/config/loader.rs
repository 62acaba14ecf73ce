//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::CredchainConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied between parsing and validation, so
/// an override is subject to the same semantic checks as a file value.
pub fn load_config(path: &Path) -> Result<CredchainConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: CredchainConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config).map_err(|e| ConfigError::Validation(vec![e]))?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `CREDCHAIN_*` environment variable overrides.
///
/// Contract addresses and the expected chain id are deployment-specific
/// and commonly injected by the environment rather than baked into the
/// config file.
///
/// This runs before the tracing subscriber exists, so a malformed
/// override is a hard error rather than a log line nobody sees.
pub fn apply_env_overrides(config: &mut CredchainConfig) -> Result<(), ValidationError> {
    let overrides: [(&str, &mut String); 5] = [
        ("CREDCHAIN_RPC_URL", &mut config.chain.rpc_url),
        (
            "CREDCHAIN_CONTRACT_UNIVERSITY_MANAGEMENT",
            &mut config.contracts.university_management,
        ),
        (
            "CREDCHAIN_CONTRACT_CLASS_MANAGEMENT",
            &mut config.contracts.class_management,
        ),
        (
            "CREDCHAIN_CONTRACT_CREDENTIAL_MANAGEMENT",
            &mut config.contracts.credential_management,
        ),
        (
            "CREDCHAIN_CONTRACT_GRADE_MANAGEMENT",
            &mut config.contracts.grade_management,
        ),
    ];
    for (var, slot) in overrides {
        if let Ok(value) = std::env::var(var) {
            *slot = value;
        }
    }

    if let Ok(value) = std::env::var("CREDCHAIN_EXPECTED_CHAIN_ID") {
        match value.parse::<u64>() {
            Ok(id) => config.chain.expected_chain_id = Some(id),
            Err(_) => {
                return Err(ValidationError {
                    field: "chain.expected_chain_id".to_string(),
                    message: format!(
                        "CREDCHAIN_EXPECTED_CHAIN_ID is not a chain id: '{}'",
                        value
                    ),
                })
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/nonexistent/credchain.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_chain_id_override() {
        let mut config = CredchainConfig::default();

        std::env::set_var("CREDCHAIN_EXPECTED_CHAIN_ID", "31337");
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.chain.expected_chain_id, Some(31337));

        // A malformed value must fail loading, not be silently ignored.
        std::env::set_var("CREDCHAIN_EXPECTED_CHAIN_ID", "mainnet");
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert_eq!(err.field, "chain.expected_chain_id");

        std::env::remove_var("CREDCHAIN_EXPECTED_CHAIN_ID");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![ValidationError {
            field: "chain.rpc_url".to_string(),
            message: "invalid URL 'x'".to_string(),
        }]);
        assert!(err.to_string().contains("chain.rpc_url"));
    }
}
