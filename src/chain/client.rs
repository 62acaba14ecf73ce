//! Ledger RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint(s)
//! - Query chain state (chain id, block number, receipts, logs)
//! - Handle timeouts and network errors gracefully
//! - Provide health check for ledger connectivity
//!
//! All methods here are read-only; nothing in this module signs or
//! broadcasts transactions.

use alloy::primitives::TxHash;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::chain::types::{ChainConfig, ChainError, ChainId, ChainResult};
use crate::observability::metrics;

/// Ledger RPC client wrapper with failover support.
#[derive(Clone)]
pub struct ChainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl ChainClient {
    /// Create a new ledger client.
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url))
                as Arc<dyn Provider + Send + Sync>,
        );

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = config.failover_urls.len(),
            "Ledger client initialized"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ChainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc(
            "All providers failed to get block number".to_string(),
        ))
    }

    /// Get a transaction receipt by hash. `None` means not yet included.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc(
            "All providers failed to get receipt".to_string(),
        ))
    }

    /// Execute a read-only contract call and return the raw return data.
    pub async fn call(
        &self,
        tx: alloy::rpc::types::TransactionRequest,
    ) -> ChainResult<alloy::primitives::Bytes> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.call(tx.clone());
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(ChainError::Rpc(
            "All providers failed to execute call".to_string(),
        ))
    }

    /// Check if the ledger is reachable and healthy.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            expected_chain_id: Some(31337), // Anvil default
            rpc_timeout_secs: 5,
            confirmation_blocks: 1,
            tx_timeout_secs: 30,
        }
    }

    #[test]
    fn test_client_creation() {
        // Client creation should succeed even if the RPC is unreachable.
        let result = ChainClient::new(test_config());
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_rpc_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let result = ChainClient::new(config);
        assert!(matches!(result, Err(ChainError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhaustion() {
        let mut config = test_config();
        config.rpc_url = "http://127.0.0.1:1".to_string();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        config.rpc_timeout_secs = 1;

        let client = ChainClient::new(config).unwrap();
        let result = client.get_chain_id().await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("All RPC providers failed"));
    }
}
