//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → CredchainConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Signing key material is never part of the config file (env only)

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdminConfig, BackendConfig, ChainConfig, ContractsConfig, CredchainConfig, ListenerConfig,
    ObservabilityConfig, StoreConfig,
};
