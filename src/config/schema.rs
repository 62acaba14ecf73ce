//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! credential service. All types derive Serde traits for deserialization
//! from config files; every section has defaults so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the credential service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CredchainConfig {
    /// HTTP listener configuration.
    pub listener: ListenerConfig,

    /// Ledger connectivity and transaction settings.
    pub chain: ChainConfig,

    /// Per-module contract addresses.
    pub contracts: ContractsConfig,

    /// University backend callback settings.
    pub backend: BackendConfig,

    /// Request/credential store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Ledger connectivity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID the service expects to be connected to.
    ///
    /// When unset the network guard is an explicit opt-out and any
    /// connected chain is accepted.
    pub expected_chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a submitted transaction to be included,
    /// in seconds. Exceeding it stops the local wait only; a broadcast
    /// transaction cannot be cancelled.
    pub tx_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            expected_chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_blocks: 3,
            tx_timeout_secs: 120,
        }
    }
}

/// Per-module contract addresses.
///
/// Each field is a hex address string. Values can be overridden through
/// `CREDCHAIN_CONTRACT_*` environment variables (see `loader`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    pub university_management: String,
    pub class_management: String,
    pub credential_management: String,
    pub grade_management: String,
}

/// University backend callback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the university backend. When unset, confirmed
    /// issuances are kept locally only.
    pub base_url: Option<String>,

    /// Maximum delivery attempts for the on-chain callback.
    pub retry_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            retry_attempts: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 5_000,
        }
    }
}

/// Store persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the JSON snapshot file. When unset, state is in-memory only.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
