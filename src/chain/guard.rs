//! Network guard: verify the connected ledger before signing anything.
//!
//! Every state-mutating chain call goes through [`NetworkGuard::ensure`]
//! first. Read-only queries skip the guard; a wrong-network read is
//! harmless, a wrong-network write is not.

use crate::chain::client::ChainClient;
use crate::chain::types::{ChainError, ChainResult};

/// Guard comparing the live chain id against the configured expectation.
#[derive(Debug, Clone, Copy)]
pub struct NetworkGuard {
    /// The chain id this deployment expects, if any. `None` is an
    /// explicit opt-out configured by the operator, not a default-allow.
    expected: Option<u64>,
}

impl NetworkGuard {
    pub fn new(expected: Option<u64>) -> Self {
        Self { expected }
    }

    /// Fail with [`ChainError::NetworkMismatch`] if the connected chain
    /// differs from the configured expectation. Succeeds silently when no
    /// expectation was configured.
    pub async fn ensure(&self, client: &ChainClient) -> ChainResult<()> {
        let Some(expected) = self.expected else {
            return Ok(());
        };

        let actual = client.get_chain_id().await?.0;
        if actual != expected {
            return Err(ChainError::NetworkMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn expected_chain_id(&self) -> Option<u64> {
        self.expected
    }
}
