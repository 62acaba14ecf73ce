//! Transaction submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Broadcast a prepared call through a signer-backed provider
//! - Poll for inclusion with a hard deadline
//! - Distinguish pre-broadcast rejection, revert, and timeout
//!
//! `submit_and_wait` is NOT idempotent: calling it twice for the same
//! logical request creates two distinct on-chain transactions. At-most-one
//! submission per request is enforced by the workflow's status guard, not
//! here.

use alloy::network::TransactionBuilder;
use alloy::primitives::TxHash;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::chain::client::ChainClient;
use crate::chain::signer::SignerHandle;
use crate::chain::types::{ChainError, ChainResult, TxOptions};
use crate::contracts::bindings::PreparedCall;

/// Gateway owning the submit → wait → inspect cycle.
#[derive(Debug, Clone)]
pub struct TxGateway {
    client: ChainClient,
}

impl TxGateway {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    /// Submit a prepared call and wait for a confirmed receipt.
    ///
    /// A [`ChainError::TxTimeout`] carries the pending hash: the local
    /// wait stopped but the transaction may still land, so the caller must
    /// record the hash and reconcile later instead of resubmitting.
    pub async fn submit_and_wait(
        &self,
        signer: &SignerHandle,
        call: &PreparedCall,
        opts: TxOptions,
    ) -> ChainResult<TransactionReceipt> {
        let tx = TransactionRequest::default()
            .with_from(signer.address())
            .with_to(call.to)
            .with_input(call.calldata.clone());

        let pending = signer
            .provider()
            .send_transaction(tx)
            .await
            .map_err(classify_send_error)?;
        let tx_hash = *pending.tx_hash();
        drop(pending);

        tracing::info!(
            method = call.method,
            contract = %call.to,
            tx_hash = %tx_hash,
            "Transaction broadcast"
        );

        self.wait_for_receipt(tx_hash, opts).await
    }

    /// Poll for the receipt of an already-broadcast transaction.
    ///
    /// Also used by reconciliation to resume waiting on a recorded hash.
    ///
    /// RPC failures while polling are treated as transient: the
    /// transaction is already out, so the only safe degradation for a
    /// sustained outage is [`ChainError::TxTimeout`] carrying the hash,
    /// never a retry-safe error that would let the caller resubmit.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        opts: TxOptions,
    ) -> ChainResult<TransactionReceipt> {
        let timeout_duration = Duration::from_secs(opts.timeout_secs);
        let poll_interval = Duration::from_secs(2);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "RPC failure while polling for receipt");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Err(ChainError::TxReverted { tx_hash });
                }

                let current_block = match self.client.get_block_number().await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "RPC failure while counting confirmations");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = current_block.saturating_sub(tx_block) as u32;

                if confirmations >= opts.confirmations.saturating_sub(1) {
                    return Ok(receipt);
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = opts.confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(ChainError::TxTimeout {
                tx_hash,
                waited_secs: opts.timeout_secs,
            }),
        }
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }
}

/// Classify a submission failure. Nothing has been broadcast in any of
/// these cases, so every variant returned here is safe to retry.
fn classify_send_error(e: RpcError<TransportErrorKind>) -> ChainError {
    match e {
        RpcError::ErrorResp(payload) => ChainError::TxRejected(payload.message.to_string()),
        RpcError::Transport(t) => ChainError::Rpc(t.to_string()),
        RpcError::LocalUsageError(err) => {
            tracing::warn!(error = %err, "Signer refused to produce a transaction");
            ChainError::SignerDeclined
        }
        other => ChainError::TxRejected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::ChainConfig;

    #[tokio::test]
    async fn test_rpc_outage_while_polling_degrades_to_timeout() {
        // The transaction is already broadcast when this is called, so a
        // dead RPC must yield TxTimeout with the hash, not a retry-safe
        // error that would invite a second submission.
        let config = ChainConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            ..ChainConfig::default()
        };
        let gateway = TxGateway::new(ChainClient::new(config).unwrap());
        let opts = TxOptions {
            timeout_secs: 1,
            confirmations: 1,
        };

        let tx_hash = TxHash::repeat_byte(0xAA);
        let err = gateway.wait_for_receipt(tx_hash, opts).await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::TxTimeout { tx_hash: h, .. } if h == tx_hash
        ));
        assert!(!err.is_retry_safe());
    }

    #[test]
    fn test_local_signer_failure_is_declined() {
        let err: RpcError<TransportErrorKind> =
            RpcError::LocalUsageError("user rejected the signing prompt".into());
        assert!(matches!(
            classify_send_error(err),
            ChainError::SignerDeclined
        ));
    }

    #[test]
    fn test_unsupported_feature_is_rejection() {
        let err: RpcError<TransportErrorKind> = RpcError::UnsupportedFeature("eip4844");
        assert!(matches!(
            classify_send_error(err),
            ChainError::TxRejected(_)
        ));
    }
}
