//! The credential request state machine.
//!
//! # Responsibilities
//! - Gate every transition on the stored status (optimistic check-and-set)
//! - Drive the on-chain pipeline for approve+issue and revoke
//! - Persist linkage exactly once, after a confirming event
//! - Record pending hashes for post-broadcast failures instead of retrying
//!
//! The store's status field is the only concurrency token: two admin
//! sessions approving the same request race on the `Pending → Approving`
//! check-and-set and exactly one submission happens.

use std::sync::Arc;
use thiserror::Error;

use crate::chain::ledger::{CredentialLedger, IssueArgs, IssueOutcome, TxProbe};
use crate::chain::types::ChainError;
use crate::credentials::model::{
    unix_now, Credential, CredentialRequest, CredentialStatus, RequestStatus,
};
use crate::credentials::notifier::{BackendNotifier, BackendPersistFailure};
use crate::credentials::store::{CredentialStore, StoreError};
use crate::observability::metrics;

/// Errors surfaced by workflow transitions.
///
/// Every variant maps to a distinct operator-facing message; nothing that
/// happens after broadcast is ever collapsed into a generic failure.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("credential request {0} not found")]
    RequestNotFound(String),

    #[error("credential {0} not found")]
    CredentialNotFound(String),

    /// The request is not in a state that permits the attempted action.
    #[error("invalid transition: request {id} is currently {actual:?}")]
    InvalidTransition { id: String, actual: RequestStatus },

    #[error("a non-empty reason is required")]
    MissingReason,

    #[error("credential {number} cannot be revoked in its current state")]
    NotRevocable { number: String },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Backend(#[from] BackendPersistFailure),

    #[error("store failure: {0}")]
    Store(String),
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RequestNotFound(id) => WorkflowError::RequestNotFound(id),
            StoreError::CredentialNotFound(number) => WorkflowError::CredentialNotFound(number),
            StoreError::StatusConflict { id, actual, .. } => {
                WorkflowError::InvalidTransition { id, actual }
            }
            other => WorkflowError::Store(other.to_string()),
        }
    }
}

/// Result of an explicit reconciliation pass on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The recorded transaction confirmed; issuance was completed.
    Completed,
    /// The recorded transaction reverted; the request is `Pending` again.
    RolledBack,
    /// Still no receipt; leave the request as-is and try again later.
    StillPending,
    /// Mined without the expected event; stays `IssuedUnconfirmed`.
    Unconfirmed,
    /// The linkage was (re-)delivered to the university backend.
    BackendSynced,
    /// The request is in a settled state; nothing to reconcile.
    NothingToDo,
}

/// Orchestrates credential request lifecycle against store, ledger, and
/// backend.
pub struct CredentialWorkflow {
    store: CredentialStore,
    ledger: Arc<dyn CredentialLedger>,
    notifier: BackendNotifier,
}

impl CredentialWorkflow {
    pub fn new(
        store: CredentialStore,
        ledger: Arc<dyn CredentialLedger>,
        notifier: BackendNotifier,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Record a newly raised request. Requests always start `Pending`.
    pub fn submit_request(&self, request: CredentialRequest) -> CredentialRequest {
        tracing::info!(
            request_id = %request.id,
            student_id = %request.student_id,
            certificate_type = request.certificate_type.as_str(),
            "Credential request raised"
        );
        self.store.insert_request(request)
    }

    /// Approve a pending request and issue the credential on-chain.
    ///
    /// At most one on-chain submission ever happens per request: the
    /// `Pending → Approving` check-and-set is taken before anything else,
    /// and post-broadcast failures keep the request out of `Pending`.
    pub async fn approve_and_issue(
        &self,
        request_id: &str,
        admin_notes: Option<String>,
    ) -> Result<CredentialRequest, WorkflowError> {
        let request = self.store.transition(
            request_id,
            RequestStatus::Pending,
            RequestStatus::Approving,
            |r| {
                if admin_notes.is_some() {
                    r.admin_notes = admin_notes.clone();
                }
            },
        )?;

        let args = IssueArgs {
            student: request.student_address,
            credential_type: request.certificate_type.as_str().to_string(),
            credential_data: request.credential_data(),
            expires_at: 0,
        };

        match self.ledger.issue(args).await {
            Ok(outcome) => self.complete_issuance(request_id, outcome).await,
            Err(e) => Err(self.handle_issue_failure(request_id, e)),
        }
    }

    /// Persist a confirmed issuance: linkage, status, projection, backend.
    async fn complete_issuance(
        &self,
        request_id: &str,
        outcome: IssueOutcome,
    ) -> Result<CredentialRequest, WorkflowError> {
        let linkage = outcome.linkage;
        let updated = self.store.transition(
            request_id,
            RequestStatus::Approving,
            RequestStatus::Issued,
            |r| {
                r.linkage = Some(linkage.clone());
                r.pending_tx_hash = None;
                r.processed_at = Some(unix_now());
            },
        )?;
        // Only a persisted Approving → Issued transition counts as issued.
        metrics::record_issuance("issued");

        let credential = Credential::from_issued_request(&updated, linkage.clone());
        match self.store.insert_credential(credential) {
            Ok(()) => {}
            Err(StoreError::DuplicateCredential { number }) => {
                // Already projected by an earlier reconciliation pass.
                tracing::warn!(request_id, credential_number = %number, "Credential already projected");
            }
            Err(e) => return Err(e.into()),
        }

        self.notifier
            .record_on_chain(request_id, &linkage)
            .await
            .map_err(|e| {
                metrics::record_backend_sync(false);
                // The ledger already reflects issuance; keep the linkage
                // and let reconcile re-deliver it. Never resubmit.
                tracing::error!(request_id, error = %e, "Backend persist failed after confirmed issuance");
                WorkflowError::Backend(e)
            })?;

        metrics::record_backend_sync(true);
        let synced = self
            .store
            .update_request(request_id, |r| r.backend_synced_at = Some(unix_now()))?;
        Ok(synced)
    }

    /// Route an issuance failure to the correct resting state.
    fn handle_issue_failure(&self, request_id: &str, error: ChainError) -> WorkflowError {
        match &error {
            // Broadcast happened but the wait window closed. Keep the
            // lock and the hash; reconciliation owns it from here.
            ChainError::TxTimeout { tx_hash, .. } => {
                metrics::record_issuance("timeout");
                let tx_hash = *tx_hash;
                let result = self
                    .store
                    .update_request(request_id, |r| r.pending_tx_hash = Some(tx_hash));
                if let Err(e) = result {
                    tracing::error!(request_id, error = %e, "Failed to record pending hash");
                }
                tracing::warn!(
                    request_id,
                    tx_hash = %tx_hash,
                    "Issuance wait timed out; request held in Approving for reconciliation"
                );
            }
            // Mined, succeeded, no event: a real inconsistency.
            ChainError::EventNotFound { tx_hash, .. } => {
                metrics::record_issuance("unconfirmed");
                let tx_hash = *tx_hash;
                let result = self.store.transition(
                    request_id,
                    RequestStatus::Approving,
                    RequestStatus::IssuedUnconfirmed,
                    |r| r.pending_tx_hash = Some(tx_hash),
                );
                if let Err(e) = result {
                    tracing::error!(request_id, error = %e, "Failed to mark request unconfirmed");
                }
                tracing::error!(
                    request_id,
                    tx_hash = %tx_hash,
                    "Issuance transaction mined without CredentialIssued event; manual reconciliation required"
                );
            }
            // Nothing reached the chain (or the revert had no effect):
            // release the lock so the action can be retried.
            _ => {
                metrics::record_issuance("failed");
                let result = self.store.transition(
                    request_id,
                    RequestStatus::Approving,
                    RequestStatus::Pending,
                    |r| r.pending_tx_hash = None,
                );
                if let Err(e) = result {
                    tracing::error!(request_id, error = %e, "Failed to roll back to Pending");
                }
                tracing::warn!(request_id, error = %error, "Issuance failed before any on-chain effect");
            }
        }
        WorkflowError::Chain(error)
    }

    /// Approve a request without an on-chain issuance. Terminal.
    pub fn approve_off_chain(
        &self,
        request_id: &str,
        admin_notes: Option<String>,
    ) -> Result<CredentialRequest, WorkflowError> {
        let updated = self.store.transition(
            request_id,
            RequestStatus::Pending,
            RequestStatus::ApprovedOffChain,
            |r| {
                r.admin_notes = admin_notes.clone();
                r.processed_at = Some(unix_now());
            },
        )?;
        tracing::info!(request_id, "Request approved off-chain");
        Ok(updated)
    }

    /// Reject a pending request. Requires a non-empty reason.
    pub fn reject(
        &self,
        request_id: &str,
        reason: &str,
    ) -> Result<CredentialRequest, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::MissingReason);
        }
        let updated = self.store.transition(
            request_id,
            RequestStatus::Pending,
            RequestStatus::Rejected,
            |r| {
                r.rejection_reason = Some(reason.to_string());
                r.processed_at = Some(unix_now());
            },
        )?;
        tracing::info!(request_id, reason, "Request rejected");
        Ok(updated)
    }

    /// Revoke an issued credential on-chain.
    ///
    /// The off-chain status only flips to `Revoked` after a confirmed
    /// `CredentialRevoked` event; a timed-out revocation records the
    /// pending hash and leaves the credential `Issued`.
    pub async fn revoke(
        &self,
        credential_number: &str,
        reason: &str,
    ) -> Result<Credential, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::MissingReason);
        }

        let credential = self
            .store
            .get_credential(credential_number)
            .ok_or_else(|| WorkflowError::CredentialNotFound(credential_number.to_string()))?;

        if credential.status != CredentialStatus::Issued || credential.pending_revoke_tx.is_some() {
            return Err(WorkflowError::NotRevocable {
                number: credential_number.to_string(),
            });
        }

        match self.ledger.revoke(credential.credential_id).await {
            Ok(outcome) => {
                metrics::record_revocation("revoked");
                let updated = self.store.update_credential(credential_number, |c| {
                    c.status = CredentialStatus::Revoked;
                    c.revoked_at = Some(outcome.event.revoked_at);
                    c.revocation_reason = Some(reason.to_string());
                    c.pending_revoke_tx = None;
                })?;
                tracing::info!(
                    credential_number,
                    tx_hash = %outcome.transaction_hash,
                    "Credential revoked"
                );
                Ok(updated)
            }
            Err(e @ (ChainError::TxTimeout { .. } | ChainError::EventNotFound { .. })) => {
                metrics::record_revocation("unresolved");
                if let Some(tx_hash) = e.pending_tx_hash() {
                    self.store.update_credential(credential_number, |c| {
                        c.pending_revoke_tx = Some(tx_hash);
                    })?;
                }
                tracing::error!(
                    credential_number,
                    error = %e,
                    "Revocation unresolved after broadcast; manual reconciliation required"
                );
                Err(WorkflowError::Chain(e))
            }
            Err(e) => {
                metrics::record_revocation("failed");
                tracing::warn!(credential_number, error = %e, "Revocation failed before any on-chain effect");
                Err(WorkflowError::Chain(e))
            }
        }
    }

    /// Explicitly resolve a request stuck after a post-broadcast failure.
    ///
    /// Never resubmits anything: it only probes the recorded hash and
    /// settles the request according to what the ledger already says.
    pub async fn reconcile(
        &self,
        request_id: &str,
    ) -> Result<ReconcileOutcome, WorkflowError> {
        let request = self
            .store
            .get_request(request_id)
            .ok_or_else(|| WorkflowError::RequestNotFound(request_id.to_string()))?;

        match request.status {
            RequestStatus::Approving | RequestStatus::IssuedUnconfirmed => {
                let Some(tx_hash) = request.pending_tx_hash else {
                    // No hash was ever recorded: a session may still be
                    // mid-submission, so releasing the lock here could
                    // allow a second submission. Leave it alone.
                    tracing::warn!(
                        request_id,
                        "Request locked without a recorded hash; leaving untouched"
                    );
                    return Ok(ReconcileOutcome::StillPending);
                };

                let from_status = request.status;
                match self.ledger.probe_issue_tx(tx_hash).await? {
                    TxProbe::NotIncluded => Ok(ReconcileOutcome::StillPending),
                    TxProbe::Reverted => {
                        self.store.transition(
                            request_id,
                            from_status,
                            RequestStatus::Pending,
                            |r| r.pending_tx_hash = None,
                        )?;
                        tracing::info!(request_id, tx_hash = %tx_hash, "Recorded transaction reverted; request released");
                        Ok(ReconcileOutcome::RolledBack)
                    }
                    TxProbe::Issued(outcome) => {
                        // Re-enter the normal completion path via Approving.
                        if from_status == RequestStatus::IssuedUnconfirmed {
                            self.store.transition(
                                request_id,
                                RequestStatus::IssuedUnconfirmed,
                                RequestStatus::Approving,
                                |_| {},
                            )?;
                        }
                        self.complete_issuance(request_id, outcome).await?;
                        Ok(ReconcileOutcome::Completed)
                    }
                    TxProbe::MissingEvent => {
                        if from_status == RequestStatus::Approving {
                            self.store.transition(
                                request_id,
                                RequestStatus::Approving,
                                RequestStatus::IssuedUnconfirmed,
                                |_| {},
                            )?;
                        }
                        Ok(ReconcileOutcome::Unconfirmed)
                    }
                }
            }
            RequestStatus::Issued if request.backend_synced_at.is_none() => {
                let linkage = request.linkage.clone().ok_or_else(|| {
                    WorkflowError::Store(format!("issued request {} has no linkage", request_id))
                })?;
                self.notifier.record_on_chain(request_id, &linkage).await?;
                self.store
                    .update_request(request_id, |r| r.backend_synced_at = Some(unix_now()))?;
                metrics::record_backend_sync(true);
                Ok(ReconcileOutcome::BackendSynced)
            }
            _ => Ok(ReconcileOutcome::NothingToDo),
        }
    }
}
