//! Public verification resolver.
//!
//! Resolution is read-only and unauthenticated. The stored projection is
//! consulted first, then the ledger's validity flag is read to tie-break:
//! the chain wins whenever it is reachable. If the RPC read fails the
//! off-chain status is served with `stale: true` so a verifier can tell
//! an authoritative answer from a cached one.

use std::sync::Arc;

use serde::Serialize;

use crate::chain::ledger::CredentialLedger;
use crate::credentials::model::{CertificateType, Credential, CredentialStatus};
use crate::credentials::store::CredentialStore;
use crate::observability::metrics;
use crate::verification::query::VerificationQuery;

/// The public subset of a credential served to verifiers.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialSummary {
    pub credential_number: String,
    pub credential_id: u64,
    pub student_id: String,
    pub certificate_type: CertificateType,
    pub issue_date: u64,
    pub verification_hash: String,
    pub transaction_hash: String,
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl From<&Credential> for CredentialSummary {
    fn from(credential: &Credential) -> Self {
        Self {
            credential_number: credential.credential_number.clone(),
            credential_id: credential.credential_id,
            student_id: credential.student_id.clone(),
            certificate_type: credential.certificate_type,
            issue_date: credential.issue_date,
            verification_hash: credential.verification_hash.clone(),
            transaction_hash: format!("{:#x}", credential.linkage.transaction_hash),
            chain_id: credential.linkage.chain_id,
            revoked_at: credential.revoked_at,
            revocation_reason: credential.revocation_reason.clone(),
        }
    }
}

/// Outcome of a verification lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified {
        credential: CredentialSummary,
        /// True when the ledger was unreachable and this answer reflects
        /// the off-chain record only.
        stale: bool,
    },
    Revoked {
        credential: CredentialSummary,
        stale: bool,
    },
    NotFound,
    Invalid {
        reason: String,
    },
}

impl VerificationOutcome {
    fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified { .. } => "verified",
            VerificationOutcome::Revoked { .. } => "revoked",
            VerificationOutcome::NotFound => "not_found",
            VerificationOutcome::Invalid { .. } => "invalid",
        }
    }
}

/// Resolves raw verification payloads against the store and the ledger.
pub struct VerificationResolver {
    store: CredentialStore,
    ledger: Arc<dyn CredentialLedger>,
}

impl VerificationResolver {
    pub fn new(store: CredentialStore, ledger: Arc<dyn CredentialLedger>) -> Self {
        Self { store, ledger }
    }

    /// Classify and resolve a raw payload end to end.
    pub async fn resolve(&self, raw: &str) -> VerificationOutcome {
        let outcome = match VerificationQuery::parse(raw) {
            Ok(query) => self.resolve_query(&query).await,
            Err(e) => VerificationOutcome::Invalid {
                reason: e.to_string(),
            },
        };
        metrics::record_verification(outcome.label());
        outcome
    }

    async fn resolve_query(&self, query: &VerificationQuery) -> VerificationOutcome {
        let credential = query
            .credential_number
            .as_deref()
            .and_then(|number| self.store.get_credential(number))
            .or_else(|| {
                query
                    .verification_hash
                    .as_deref()
                    .and_then(|hash| self.store.get_credential_by_hash(hash))
            });

        let Some(credential) = credential else {
            return VerificationOutcome::NotFound;
        };

        let summary = CredentialSummary::from(&credential);

        match self.ledger.credential_valid(credential.credential_id).await {
            Ok(true) => {
                if credential.status == CredentialStatus::Revoked {
                    // A divergence means a local revocation never confirmed
                    // on-chain. The ledger is authoritative.
                    tracing::warn!(
                        credential_number = %credential.credential_number,
                        "Ledger reports valid but local record is revoked"
                    );
                }
                VerificationOutcome::Verified {
                    credential: summary,
                    stale: false,
                }
            }
            Ok(false) => VerificationOutcome::Revoked {
                credential: summary,
                stale: false,
            },
            Err(e) => {
                tracing::warn!(
                    credential_number = %credential.credential_number,
                    error = %e,
                    "Ledger unreachable, serving off-chain status as stale"
                );
                match credential.status {
                    CredentialStatus::Issued => VerificationOutcome::Verified {
                        credential: summary,
                        stale: true,
                    },
                    CredentialStatus::Revoked => VerificationOutcome::Revoked {
                        credential: summary,
                        stale: true,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ledger::{IssueArgs, IssueOutcome, RevokeOutcome, TxProbe};
    use crate::chain::types::{ChainError, ChainResult};
    use crate::credentials::model::{
        CertificateType, Credential, CredentialRequest, OnChainLinkage,
    };
    use alloy::primitives::{Address, TxHash};
    use async_trait::async_trait;

    /// Scripted validity answers; issuance paths are unreachable here.
    struct ValidityLedger {
        answer: Option<bool>,
    }

    #[async_trait]
    impl CredentialLedger for ValidityLedger {
        async fn issue(&self, _args: IssueArgs) -> ChainResult<IssueOutcome> {
            unreachable!("resolver never issues")
        }

        async fn revoke(&self, _credential_id: u64) -> ChainResult<RevokeOutcome> {
            unreachable!("resolver never revokes")
        }

        async fn credential_valid(&self, _credential_id: u64) -> ChainResult<bool> {
            self.answer
                .ok_or_else(|| ChainError::Rpc("all providers failed".to_string()))
        }

        async fn probe_issue_tx(&self, _tx_hash: TxHash) -> ChainResult<TxProbe> {
            unreachable!("resolver never probes")
        }
    }

    fn issued_credential() -> Credential {
        let request = CredentialRequest::new(
            "SV001".to_string(),
            Address::repeat_byte(1),
            CertificateType::Subject,
        );
        Credential::from_issued_request(
            &request,
            OnChainLinkage {
                transaction_hash: TxHash::repeat_byte(0xAA),
                block_number: Some(1000),
                chain_id: 31337,
                contract_address: Address::repeat_byte(0x11),
                emitted_credential_id: 42,
            },
        )
    }

    fn resolver(answer: Option<bool>) -> (VerificationResolver, Credential) {
        let store = CredentialStore::new(None);
        let credential = issued_credential();
        store.insert_credential(credential.clone()).unwrap();
        (
            VerificationResolver::new(store, Arc::new(ValidityLedger { answer })),
            credential,
        )
    }

    #[tokio::test]
    async fn test_verified_by_number() {
        let (resolver, _) = resolver(Some(true));
        let outcome = resolver.resolve("SUB-000042").await;
        assert!(matches!(
            outcome,
            VerificationOutcome::Verified { stale: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_verified_by_hash() {
        let (resolver, credential) = resolver(Some(true));
        let outcome = resolver.resolve(&credential.verification_hash).await;
        assert!(matches!(
            outcome,
            VerificationOutcome::Verified { stale: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_verified_from_url() {
        let (resolver, _) = resolver(Some(true));
        let outcome = resolver
            .resolve("https://host/verify?credentialNumber=SUB-000042")
            .await;
        assert!(matches!(outcome, VerificationOutcome::Verified { .. }));
    }

    #[tokio::test]
    async fn test_ledger_revocation_wins() {
        // Locally still Issued; the ledger says invalid.
        let (resolver, _) = resolver(Some(false));
        let outcome = resolver.resolve("SUB-000042").await;
        assert!(matches!(
            outcome,
            VerificationOutcome::Revoked { stale: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_rpc_failure_serves_stale() {
        let (resolver, _) = resolver(None);
        let outcome = resolver.resolve("SUB-000042").await;
        assert!(matches!(
            outcome,
            VerificationOutcome::Verified { stale: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_number_is_not_found() {
        let (resolver, _) = resolver(Some(true));
        let outcome = resolver.resolve("SUB-999999").await;
        assert!(matches!(outcome, VerificationOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_empty_payload_is_invalid() {
        let (resolver, _) = resolver(Some(true));
        let outcome = resolver.resolve("  ").await;
        assert!(matches!(outcome, VerificationOutcome::Invalid { .. }));
    }
}
