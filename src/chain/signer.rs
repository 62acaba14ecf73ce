//! Signing session management.
//!
//! # Security
//! - Signing keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//!
//! A session is acquired fresh for every logical operation and dropped
//! when that operation completes. Nothing caches a signer across
//! unrelated operations; the active key may be rotated between them.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;

use crate::chain::types::{ChainConfig, ChainError, ChainResult};

/// Environment variable name for the signing key.
pub const SIGNER_KEY_ENV_VAR: &str = "CREDCHAIN_SIGNER_KEY";

/// A wallet-backed provider acquired for a single logical operation.
///
/// The provider signs and broadcasts through the configured primary RPC
/// endpoint; read-side polling stays on [`crate::chain::ChainClient`].
#[derive(Clone)]
pub struct SignerHandle {
    provider: Arc<dyn Provider + Send + Sync>,
    address: Address,
}

impl SignerHandle {
    /// The signing account's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The signer-backed provider used for submission.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.provider.as_ref()
    }
}

impl std::fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerHandle")
            .field("address", &self.address)
            .finish()
    }
}

/// Factory for per-operation signing sessions.
#[derive(Debug, Clone)]
pub struct SigningSession {
    rpc_url: String,
}

impl SigningSession {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            rpc_url: config.rpc_url.clone(),
        }
    }

    /// Acquire a signer for one logical operation.
    ///
    /// Reads the key from the environment on every call so a rotated key
    /// takes effect without a restart. Fails with
    /// [`ChainError::WalletUnavailable`] when no usable key is present.
    pub fn acquire(&self) -> ChainResult<SignerHandle> {
        let private_key = std::env::var(SIGNER_KEY_ENV_VAR).map_err(|_| {
            ChainError::WalletUnavailable(format!(
                "environment variable {} not set",
                SIGNER_KEY_ENV_VAR
            ))
        })?;

        self.acquire_with_key(&private_key)
    }

    /// Build a session from an explicit hex key (with or without 0x prefix).
    pub fn acquire_with_key(&self, private_key_hex: &str) -> ChainResult<SignerHandle> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            ChainError::WalletUnavailable(format!("invalid signing key format: {}", e))
        })?;

        let address = signer.address();
        let url: url::Url = self
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL '{}': {}", self.rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);

        tracing::debug!(signer = %address, "Signing session acquired");

        Ok(SignerHandle {
            provider: Arc::new(provider),
            address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn session() -> SigningSession {
        SigningSession::new(&ChainConfig::default())
    }

    #[test]
    fn test_acquire_with_key() {
        let handle = session().acquire_with_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            handle.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_acquire_with_0x_prefix() {
        let handle = session()
            .acquire_with_key(&format!("0x{}", TEST_PRIVATE_KEY))
            .unwrap();
        assert_eq!(
            handle.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_key() {
        let result = session().acquire_with_key("not_a_key");
        assert!(matches!(result, Err(ChainError::WalletUnavailable(_))));
    }
}
