//! Contract surface subsystem.
//!
//! # Data Flow
//! ```text
//! ContractsConfig (per-module addresses)
//!     → registry (parse & hold typed bindings)
//!     → bindings.rs (argument validation, calldata encoding)
//!     → chain::gateway (submission)
//! ```
//!
//! Modules with an empty configured address are simply absent from the
//! registry; binding them fails with `ContractNotConfigured` rather than
//! submitting to the zero address.

pub mod abi;
pub mod bindings;

use alloy::primitives::Address;

use crate::chain::types::{ChainError, ChainResult};
use crate::config::schema::ContractsConfig;
use bindings::{ClassContract, CredentialContract, GradeContract};

/// Typed bindings for every configured on-chain module.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    university: Option<Address>,
    classes: Option<ClassContract>,
    credentials: Option<CredentialContract>,
    grades: Option<GradeContract>,
}

impl ContractRegistry {
    /// Build the registry from validated configuration.
    pub fn from_config(config: &ContractsConfig) -> ChainResult<Self> {
        Ok(Self {
            university: parse_optional(&config.university_management, "universityManagement")?,
            classes: parse_optional(&config.class_management, "classManagement")?
                .map(ClassContract::new),
            credentials: parse_optional(&config.credential_management, "credentialManagement")?
                .map(CredentialContract::new),
            grades: parse_optional(&config.grade_management, "gradeManagement")?
                .map(GradeContract::new),
        })
    }

    pub fn credentials(&self) -> ChainResult<&CredentialContract> {
        self.credentials
            .as_ref()
            .ok_or(ChainError::ContractNotConfigured("CredentialManagement"))
    }

    pub fn grades(&self) -> ChainResult<&GradeContract> {
        self.grades
            .as_ref()
            .ok_or(ChainError::ContractNotConfigured("GradeManagement"))
    }

    pub fn classes(&self) -> ChainResult<&ClassContract> {
        self.classes
            .as_ref()
            .ok_or(ChainError::ContractNotConfigured("ClassManagement"))
    }

    pub fn university(&self) -> ChainResult<Address> {
        self.university
            .ok_or(ChainError::ContractNotConfigured("UniversityManagement"))
    }
}

fn parse_optional(value: &str, module: &'static str) -> ChainResult<Option<Address>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<Address>()
        .map(Some)
        .map_err(|e| ChainError::InvalidArgument {
            method: module,
            reason: format!("invalid contract address '{}': {}", value, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_yields_unconfigured_modules() {
        let registry = ContractRegistry::from_config(&ContractsConfig::default()).unwrap();
        assert!(matches!(
            registry.credentials(),
            Err(ChainError::ContractNotConfigured("CredentialManagement"))
        ));
    }

    #[test]
    fn test_configured_module_binds() {
        let config = ContractsConfig {
            credential_management: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            ..ContractsConfig::default()
        };
        let registry = ContractRegistry::from_config(&config).unwrap();
        assert!(registry.credentials().is_ok());
        assert!(registry.grades().is_err());
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let config = ContractsConfig {
            grade_management: "0xnothex".to_string(),
            ..ContractsConfig::default()
        };
        assert!(ContractRegistry::from_config(&config).is_err());
    }
}
