//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones: addresses must parse,
//! URLs must parse, timeouts must be non-zero. Returns all validation
//! errors, not just the first, so an operator can fix a config in one pass.

use alloy::primitives::Address;

use crate::config::schema::CredchainConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Config field path (e.g., "chain.rpc_url").
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &CredchainConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError {
            field: "chain.rpc_url".to_string(),
            message: format!("invalid URL '{}'", config.chain.rpc_url),
        });
    }
    for (i, u) in config.chain.failover_urls.iter().enumerate() {
        if u.parse::<url::Url>().is_err() {
            errors.push(ValidationError {
                field: format!("chain.failover_urls[{}]", i),
                message: format!("invalid URL '{}'", u),
            });
        }
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "chain.rpc_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.chain.tx_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "chain.tx_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.chain.confirmation_blocks == 0 {
        errors.push(ValidationError {
            field: "chain.confirmation_blocks".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    let contracts = [
        ("contracts.university_management", &config.contracts.university_management),
        ("contracts.class_management", &config.contracts.class_management),
        ("contracts.credential_management", &config.contracts.credential_management),
        ("contracts.grade_management", &config.contracts.grade_management),
    ];
    for (field, value) in contracts {
        if !value.is_empty() && value.parse::<Address>().is_err() {
            errors.push(ValidationError {
                field: field.to_string(),
                message: format!("invalid contract address '{}'", value),
            });
        }
    }

    if let Some(base) = &config.backend.base_url {
        if base.parse::<url::Url>().is_err() {
            errors.push(ValidationError {
                field: "backend.base_url".to_string(),
                message: format!("invalid URL '{}'", base),
            });
        }
    }
    if config.backend.retry_attempts == 0 {
        errors.push(ValidationError {
            field: "backend.retry_attempts".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address".to_string(),
            message: format!(
                "invalid socket address '{}'",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CredchainConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = CredchainConfig::default();
        config.chain.rpc_url = "not a url".to_string();
        config.chain.confirmation_blocks = 0;
        config.contracts.credential_management = "0xnothex".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "chain.rpc_url"));
        assert!(errors
            .iter()
            .any(|e| e.field == "contracts.credential_management"));
    }

    #[test]
    fn test_empty_contract_address_allowed() {
        // Unconfigured modules are fine; the registry refuses to bind them.
        let config = CredchainConfig::default();
        assert!(config.contracts.grade_management.is_empty());
        assert!(validate_config(&config).is_ok());
    }
}
