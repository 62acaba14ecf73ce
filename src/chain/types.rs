//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while driving an on-chain operation.
///
/// The variants split into two classes with very different handling:
/// everything that fails before a transaction is broadcast is safe to
/// retry; `TxTimeout` and `EventNotFound` happen after broadcast and must
/// go through reconciliation instead, since a retry risks double issuance.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No signing key material is available.
    #[error("signing wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The signer refused to sign the transaction. Nothing was broadcast.
    #[error("signer declined to sign the transaction")]
    SignerDeclined,

    /// The node rejected the call before broadcast (insufficient balance,
    /// nonce conflict, malformed call).
    #[error("transaction rejected before broadcast: {0}")]
    TxRejected(String),

    /// The connected ledger is not the one this deployment expects.
    #[error("chain id mismatch: expected {expected}, got {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// The transaction was broadcast but not included within the wait
    /// window. It is NOT necessarily dead; the hash is kept so a later
    /// reconciliation pass can resolve it.
    #[error("transaction {tx_hash} not confirmed within {waited_secs}s")]
    TxTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// The transaction was mined but reverted. No on-chain effect occurred.
    #[error("transaction {tx_hash} reverted on-chain")]
    TxReverted { tx_hash: TxHash },

    /// The transaction was mined successfully but the expected business
    /// event was not in its logs. This is a serious inconsistency and
    /// must be surfaced for manual reconciliation, never retried.
    #[error("transaction {tx_hash} succeeded but no {event} event was emitted")]
    EventNotFound {
        tx_hash: TxHash,
        event: &'static str,
    },

    /// A method argument failed shape validation before submission.
    #[error("invalid argument for {method}: {reason}")]
    InvalidArgument {
        method: &'static str,
        reason: String,
    },

    /// The requested contract module has no configured address.
    #[error("contract module {0} is not configured")]
    ContractNotConfigured(&'static str),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Whether the operation can be retried immediately without risking a
    /// duplicate on-chain effect.
    pub fn is_retry_safe(&self) -> bool {
        match self {
            ChainError::WalletUnavailable(_)
            | ChainError::SignerDeclined
            | ChainError::TxRejected(_)
            | ChainError::NetworkMismatch { .. }
            | ChainError::TxReverted { .. }
            | ChainError::InvalidArgument { .. }
            | ChainError::ContractNotConfigured(_)
            | ChainError::Rpc(_) => true,
            ChainError::TxTimeout { .. } | ChainError::EventNotFound { .. } => false,
        }
    }

    /// The pending transaction hash for post-broadcast failures.
    pub fn pending_tx_hash(&self) -> Option<TxHash> {
        match self {
            ChainError::TxTimeout { tx_hash, .. } | ChainError::EventNotFound { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Options controlling a submit-and-wait cycle.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    /// Maximum time to wait for inclusion, in seconds.
    pub timeout_secs: u64,
    /// Confirmation depth before a receipt is considered final.
    pub confirmations: u32,
}

impl From<&ChainConfig> for TxOptions {
    fn from(config: &ChainConfig) -> Self {
        Self {
            timeout_secs: config.tx_timeout_secs,
            confirmations: config.confirmation_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::TxHash;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_retry_safety_split() {
        assert!(ChainError::SignerDeclined.is_retry_safe());
        assert!(ChainError::TxReverted {
            tx_hash: TxHash::ZERO
        }
        .is_retry_safe());

        let timeout = ChainError::TxTimeout {
            tx_hash: TxHash::ZERO,
            waited_secs: 120,
        };
        assert!(!timeout.is_retry_safe());
        assert_eq!(timeout.pending_tx_hash(), Some(TxHash::ZERO));

        let missing = ChainError::EventNotFound {
            tx_hash: TxHash::ZERO,
            event: "CredentialIssued",
        };
        assert!(!missing.is_retry_safe());
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::NetworkMismatch {
            expected: 31337,
            actual: 1,
        };
        assert_eq!(err.to_string(), "chain id mismatch: expected 31337, got 1");
    }
}
