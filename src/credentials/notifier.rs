//! University backend callback.
//!
//! After an issuance is confirmed on-chain, the linkage is pushed to the
//! university backend so its records reflect the chain. The call is
//! idempotent on `transactionHash` server-side, which is what makes the
//! retry here safe: we resend the same linkage, never a new transaction.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::BackendConfig;
use crate::credentials::model::OnChainLinkage;

/// The backend refused or never accepted the linkage. The ledger already
/// reflects issuance at this point, so the caller must keep the linkage
/// and retry delivery, not the transaction.
#[derive(Debug, Error)]
#[error("backend persist failure for request {request_id}: {reason}")]
pub struct BackendPersistFailure {
    pub request_id: String,
    pub reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OnChainBody {
    transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
    chain_id: u64,
    contract_address: String,
}

/// Delivers confirmed linkages to the university backend.
#[derive(Debug, Clone)]
pub struct BackendNotifier {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendNotifier {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Push a confirmed linkage. A deployment without a configured
    /// backend keeps linkages locally only and this is a no-op.
    pub async fn record_on_chain(
        &self,
        request_id: &str,
        linkage: &OnChainLinkage,
    ) -> Result<(), BackendPersistFailure> {
        let Some(base_url) = &self.config.base_url else {
            tracing::debug!(request_id, "No backend configured, keeping linkage locally");
            return Ok(());
        };

        let url = format!(
            "{}/credentials/{}/on-chain",
            base_url.trim_end_matches('/'),
            request_id
        );
        let body = OnChainBody {
            transaction_hash: format!("{:#x}", linkage.transaction_hash),
            block_number: linkage.block_number,
            chain_id: linkage.chain_id,
            contract_address: format!("{:#x}", linkage.contract_address),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.config.retry_attempts {
            match self.client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(request_id, attempt, "Linkage recorded at backend");
                    return Ok(());
                }
                Ok(response) => {
                    last_error = format!("backend returned {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < self.config.retry_attempts {
                let backoff = calculate_backoff(
                    attempt,
                    self.config.retry_base_delay_ms,
                    self.config.retry_max_delay_ms,
                );
                tracing::warn!(
                    request_id,
                    attempt,
                    error = %last_error,
                    delay = ?backoff,
                    "Backend callback failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(BackendPersistFailure {
            request_id: request_id.to_string(),
            reason: last_error,
        })
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, TxHash};

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
    }

    #[tokio::test]
    async fn test_no_backend_is_noop() {
        let notifier = BackendNotifier::new(BackendConfig::default());
        let linkage = OnChainLinkage {
            transaction_hash: TxHash::repeat_byte(0xAA),
            block_number: Some(1000),
            chain_id: 31337,
            contract_address: Address::repeat_byte(0x11),
            emitted_credential_id: 42,
        };
        assert!(notifier.record_on_chain("req-1", &linkage).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_after_retries() {
        let config = BackendConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            retry_attempts: 2,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 2,
        };
        let notifier = BackendNotifier::new(config);
        let linkage = OnChainLinkage {
            transaction_hash: TxHash::repeat_byte(0xAA),
            block_number: None,
            chain_id: 31337,
            contract_address: Address::repeat_byte(0x11),
            emitted_credential_id: 42,
        };
        let err = notifier.record_on_chain("req-1", &linkage).await.unwrap_err();
        assert_eq!(err.request_id, "req-1");
    }
}
