//! Request and credential storage.
//!
//! The store is the single source of truth for request status. Concurrent
//! admin sessions are serialized by the atomic check-and-set in
//! [`CredentialStore::transition`] — the stored status field is the
//! concurrency-control token, not an in-process mutex, so the guarantee
//! holds across sessions.
//!
//! Requests are never deleted; rejected and issued records remain for
//! audit.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::credentials::model::{Credential, CredentialRequest, RequestStatus};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential request {0} not found")]
    RequestNotFound(String),

    #[error("credential {0} not found")]
    CredentialNotFound(String),

    /// The optimistic status check failed: another session got there first
    /// or the request is not in a state that permits this transition.
    #[error("request {id} is {actual:?}, expected {expected:?}")]
    StatusConflict {
        id: String,
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error("credential {number} already recorded")]
    DuplicateCredential { number: String },

    #[error("persistence error: {0}")]
    Persistence(String),
}

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    requests: HashMap<String, CredentialRequest>,
    credentials: HashMap<String, Credential>,
}

/// Thread-safe store for requests and issued credential projections.
#[derive(Clone, Default)]
pub struct CredentialStore {
    requests: Arc<DashMap<String, CredentialRequest>>,
    /// Keyed by credential number.
    credentials: Arc<DashMap<String, Credential>>,
    /// Secondary index: verification hash → credential number.
    by_hash: Arc<DashMap<String, String>>,
    persistence_path: Option<String>,
}

impl CredentialStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            credentials: Arc::new(DashMap::new()),
            by_hash: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from the snapshot file if it exists.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            for (k, v) in snapshot.requests {
                store.requests.insert(k, v);
            }
            for (number, credential) in snapshot.credentials {
                store
                    .by_hash
                    .insert(credential.verification_hash.clone(), number.clone());
                store.credentials.insert(number, credential);
            }
            tracing::info!(
                requests = store.requests.len(),
                credentials = store.credentials.len(),
                "Loaded store snapshot"
            );
        }
        Ok(store)
    }

    /// Save a snapshot to the configured path, if any.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);

            let snapshot = Snapshot {
                requests: self
                    .requests
                    .iter()
                    .map(|r| (r.key().clone(), r.value().clone()))
                    .collect(),
                credentials: self
                    .credentials
                    .iter()
                    .map(|r| (r.key().clone(), r.value().clone()))
                    .collect(),
            };
            serde_json::to_writer(writer, &snapshot)?;
        }
        Ok(())
    }

    fn persist_best_effort(&self) {
        if let Err(e) = self.save_to_file() {
            tracing::warn!(error = %e, "Failed to persist store snapshot");
        }
    }

    // --- requests ---

    pub fn insert_request(&self, request: CredentialRequest) -> CredentialRequest {
        self.requests.insert(request.id.clone(), request.clone());
        self.persist_best_effort();
        request
    }

    pub fn get_request(&self, id: &str) -> Option<CredentialRequest> {
        self.requests.get(id).map(|r| r.value().clone())
    }

    pub fn list_requests(&self, status: Option<RequestStatus>) -> Vec<CredentialRequest> {
        self.requests
            .iter()
            .filter(|r| status.map_or(true, |s| r.value().status == s))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Atomically move a request from `expected` status to `to`.
    ///
    /// The entry lock is held for the duration, so two sessions racing on
    /// the same request observe a strict order: exactly one wins, the
    /// other gets [`StoreError::StatusConflict`].
    pub fn transition(
        &self,
        id: &str,
        expected: RequestStatus,
        to: RequestStatus,
        apply: impl FnOnce(&mut CredentialRequest),
    ) -> Result<CredentialRequest, StoreError> {
        let mut entry = self
            .requests
            .get_mut(id)
            .ok_or_else(|| StoreError::RequestNotFound(id.to_string()))?;

        if entry.status != expected {
            return Err(StoreError::StatusConflict {
                id: id.to_string(),
                expected,
                actual: entry.status,
            });
        }

        entry.status = to;
        apply(&mut entry);
        let updated = entry.clone();
        drop(entry);

        self.persist_best_effort();
        Ok(updated)
    }

    /// Mutate a request without a status transition (e.g., recording a
    /// pending hash while it stays `Approving`).
    pub fn update_request(
        &self,
        id: &str,
        apply: impl FnOnce(&mut CredentialRequest),
    ) -> Result<CredentialRequest, StoreError> {
        let mut entry = self
            .requests
            .get_mut(id)
            .ok_or_else(|| StoreError::RequestNotFound(id.to_string()))?;
        apply(&mut entry);
        let updated = entry.clone();
        drop(entry);

        self.persist_best_effort();
        Ok(updated)
    }

    // --- credentials ---

    pub fn insert_credential(&self, credential: Credential) -> Result<(), StoreError> {
        let number = credential.credential_number.clone();
        if self.credentials.contains_key(&number) {
            return Err(StoreError::DuplicateCredential { number });
        }
        self.by_hash
            .insert(credential.verification_hash.clone(), number.clone());
        self.credentials.insert(number, credential);
        self.persist_best_effort();
        Ok(())
    }

    pub fn get_credential(&self, number: &str) -> Option<Credential> {
        self.credentials.get(number).map(|r| r.value().clone())
    }

    pub fn get_credential_by_hash(&self, verification_hash: &str) -> Option<Credential> {
        let number = self.by_hash.get(verification_hash)?.value().clone();
        self.get_credential(&number)
    }

    pub fn update_credential(
        &self,
        number: &str,
        apply: impl FnOnce(&mut Credential),
    ) -> Result<Credential, StoreError> {
        let mut entry = self
            .credentials
            .get_mut(number)
            .ok_or_else(|| StoreError::CredentialNotFound(number.to_string()))?;
        apply(&mut entry);
        let updated = entry.clone();
        drop(entry);

        self.persist_best_effort();
        Ok(updated)
    }

    /// Counts by request status, for the admin status endpoint.
    pub fn request_summary(&self) -> HashMap<RequestStatus, usize> {
        let mut summary = HashMap::new();
        for r in self.requests.iter() {
            *summary.entry(r.value().status).or_insert(0) += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::model::{CertificateType, OnChainLinkage};
    use alloy::primitives::{Address, TxHash};

    fn request() -> CredentialRequest {
        CredentialRequest::new(
            "SV001".to_string(),
            Address::repeat_byte(1),
            CertificateType::Subject,
        )
    }

    fn linkage() -> OnChainLinkage {
        OnChainLinkage {
            transaction_hash: TxHash::repeat_byte(0xAA),
            block_number: Some(1000),
            chain_id: 31337,
            contract_address: Address::repeat_byte(0x11),
            emitted_credential_id: 42,
        }
    }

    #[test]
    fn test_transition_cas() {
        let store = CredentialStore::new(None);
        let req = store.insert_request(request());

        let updated = store
            .transition(&req.id, RequestStatus::Pending, RequestStatus::Approving, |_| {})
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Approving);

        // A second Pending→Approving attempt must observe the conflict.
        let err = store
            .transition(&req.id, RequestStatus::Pending, RequestStatus::Approving, |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StatusConflict {
                actual: RequestStatus::Approving,
                ..
            }
        ));
    }

    #[test]
    fn test_transition_missing_request() {
        let store = CredentialStore::new(None);
        let err = store
            .transition("nope", RequestStatus::Pending, RequestStatus::Rejected, |_| {})
            .unwrap_err();
        assert!(matches!(err, StoreError::RequestNotFound(_)));
    }

    #[test]
    fn test_credential_lookup_by_hash() {
        let store = CredentialStore::new(None);
        let credential = Credential::from_issued_request(&request(), linkage());
        let hash = credential.verification_hash.clone();
        store.insert_credential(credential).unwrap();

        let found = store.get_credential_by_hash(&hash).unwrap();
        assert_eq!(found.credential_number, "SUB-000042");
        assert!(store.get_credential_by_hash("0xdead").is_none());
    }

    #[test]
    fn test_duplicate_credential_rejected() {
        let store = CredentialStore::new(None);
        let credential = Credential::from_issued_request(&request(), linkage());
        store.insert_credential(credential.clone()).unwrap();
        assert!(matches!(
            store.insert_credential(credential),
            Err(StoreError::DuplicateCredential { .. })
        ));
    }

    #[test]
    fn test_request_summary_counts_by_status() {
        let store = CredentialStore::new(None);
        store.insert_request(request());
        store.insert_request(request());
        let rejected = store.insert_request(request());
        store
            .transition(&rejected.id, RequestStatus::Pending, RequestStatus::Rejected, |_| {})
            .unwrap();

        let summary = store.request_summary();
        assert_eq!(summary.get(&RequestStatus::Pending), Some(&2));
        assert_eq!(summary.get(&RequestStatus::Rejected), Some(&1));
        assert_eq!(summary.get(&RequestStatus::Issued), None);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir().join("credchain_store_test.json");
        let path_str = path.to_str().unwrap().to_string();

        {
            let store = CredentialStore::new(Some(path_str.clone()));
            let req = store.insert_request(request());
            store
                .transition(&req.id, RequestStatus::Pending, RequestStatus::Rejected, |r| {
                    r.rejection_reason = Some("incomplete transcript".to_string());
                })
                .unwrap();
        }

        let loaded = CredentialStore::load_from_file(&path_str).unwrap();
        let all = loaded.list_requests(Some(RequestStatus::Rejected));
        assert_eq!(all.len(), 1);
        assert_eq!(
            all[0].rejection_reason.as_deref(),
            Some("incomplete transcript")
        );

        std::fs::remove_file(path).unwrap_or_default();
    }
}
