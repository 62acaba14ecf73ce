//! Shared test fixtures: a scripted ledger standing in for the chain.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use credchain::chain::ledger::{
    CredentialLedger, IssueArgs, IssueOutcome, RevokeOutcome, TxProbe,
};
use credchain::chain::types::{ChainError, ChainResult};
use credchain::chain::events::{IssuedEvent, RevokedEvent};
use credchain::config::BackendConfig;
use credchain::credentials::model::{CertificateType, CredentialRequest, OnChainLinkage};
use credchain::credentials::notifier::BackendNotifier;
use credchain::credentials::store::CredentialStore;
use credchain::credentials::CredentialWorkflow;

pub const TX_HASH: TxHash = TxHash::repeat_byte(0xAA);
pub const CONTRACT: Address = Address::repeat_byte(0x11);
pub const STUDENT: Address = Address::repeat_byte(0x01);
pub const ISSUER: Address = Address::repeat_byte(0x02);
pub const CHAIN_ID: u64 = 31337;

/// One scripted answer for an `issue` call.
pub enum IssueScript {
    Confirmed { credential_id: u64 },
    Declined,
    Reverted,
    Timeout,
    MissingEvent,
}

/// One scripted answer for a `probe_issue_tx` call.
pub enum ProbeScript {
    NotIncluded,
    Reverted,
    Confirmed { credential_id: u64 },
    MissingEvent,
}

/// One scripted answer for a `revoke` call.
pub enum RevokeScript {
    Confirmed { credential_id: u64 },
    Timeout,
}

pub fn linkage(credential_id: u64) -> OnChainLinkage {
    OnChainLinkage {
        transaction_hash: TX_HASH,
        block_number: Some(1000),
        chain_id: CHAIN_ID,
        contract_address: CONTRACT,
        emitted_credential_id: credential_id,
    }
}

fn outcome(credential_id: u64) -> IssueOutcome {
    IssueOutcome {
        event: IssuedEvent {
            credential_id,
            student: STUDENT,
            issued_by: ISSUER,
        },
        linkage: linkage(credential_id),
    }
}

/// Ledger double driven by per-call scripts. Calls with no script panic
/// so a test fails loudly when the workflow touches the chain
/// unexpectedly.
#[derive(Default)]
pub struct MockLedger {
    pub issue_scripts: Mutex<VecDeque<IssueScript>>,
    pub probe_scripts: Mutex<VecDeque<ProbeScript>>,
    pub revoke_scripts: Mutex<VecDeque<RevokeScript>>,
    /// `None` means the validity read fails with an RPC error.
    pub validity: Mutex<Option<bool>>,
    pub issue_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            validity: Mutex::new(Some(true)),
            ..Self::default()
        }
    }

    pub fn script_issue(&self, script: IssueScript) {
        self.issue_scripts.lock().unwrap().push_back(script);
    }

    pub fn script_probe(&self, script: ProbeScript) {
        self.probe_scripts.lock().unwrap().push_back(script);
    }

    pub fn script_revoke(&self, script: RevokeScript) {
        self.revoke_scripts.lock().unwrap().push_back(script);
    }

    pub fn set_validity(&self, validity: Option<bool>) {
        *self.validity.lock().unwrap() = validity;
    }

    pub fn issue_call_count(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialLedger for MockLedger {
    async fn issue(&self, _args: IssueArgs) -> ChainResult<IssueOutcome> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .issue_scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected issue call");
        match script {
            IssueScript::Confirmed { credential_id } => Ok(outcome(credential_id)),
            IssueScript::Declined => Err(ChainError::SignerDeclined),
            IssueScript::Reverted => Err(ChainError::TxReverted { tx_hash: TX_HASH }),
            IssueScript::Timeout => Err(ChainError::TxTimeout {
                tx_hash: TX_HASH,
                waited_secs: 120,
            }),
            IssueScript::MissingEvent => Err(ChainError::EventNotFound {
                tx_hash: TX_HASH,
                event: "CredentialIssued",
            }),
        }
    }

    async fn revoke(&self, credential_id: u64) -> ChainResult<RevokeOutcome> {
        let script = self
            .revoke_scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected revoke call");
        match script {
            RevokeScript::Confirmed { credential_id: id } => {
                assert_eq!(id, credential_id, "revoked a different credential");
                Ok(RevokeOutcome {
                    event: RevokedEvent {
                        credential_id: id,
                        revoked_by: ISSUER,
                        revoked_at: 1_700_000_000,
                    },
                    transaction_hash: TX_HASH,
                    block_number: Some(1001),
                })
            }
            RevokeScript::Timeout => Err(ChainError::TxTimeout {
                tx_hash: TX_HASH,
                waited_secs: 120,
            }),
        }
    }

    async fn credential_valid(&self, _credential_id: u64) -> ChainResult<bool> {
        self.validity
            .lock()
            .unwrap()
            .ok_or_else(|| ChainError::Rpc("all providers failed".to_string()))
    }

    async fn probe_issue_tx(&self, _tx_hash: TxHash) -> ChainResult<TxProbe> {
        let script = self
            .probe_scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected probe call");
        Ok(match script {
            ProbeScript::NotIncluded => TxProbe::NotIncluded,
            ProbeScript::Reverted => TxProbe::Reverted,
            ProbeScript::Confirmed { credential_id } => TxProbe::Issued(outcome(credential_id)),
            ProbeScript::MissingEvent => TxProbe::MissingEvent,
        })
    }
}

pub fn workflow_with(ledger: std::sync::Arc<MockLedger>) -> (CredentialWorkflow, CredentialStore) {
    let store = CredentialStore::new(None);
    let workflow = CredentialWorkflow::new(
        store.clone(),
        ledger,
        BackendNotifier::new(BackendConfig::default()),
    );
    (workflow, store)
}

pub fn pending_request(workflow: &CredentialWorkflow) -> CredentialRequest {
    workflow.submit_request(CredentialRequest::new(
        "SV001".to_string(),
        STUDENT,
        CertificateType::Subject,
    ))
}
