//! Credential domain entities.
//!
//! `CredentialRequest` is the off-chain approval record; `Credential` is
//! the projection of an issued request plus its on-chain identifier.
//! Requests are never deleted (audit requirement) and a request's
//! `OnChainLinkage` is written exactly once.

use alloy::primitives::{keccak256, Address, TxHash};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The kind of academic credential a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    Subject,
    Semester,
    Roadmap,
    Completion,
}

impl CertificateType {
    /// The `credentialType` string carried on-chain.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::Subject => "Subject",
            CertificateType::Semester => "Semester",
            CertificateType::Roadmap => "Roadmap",
            CertificateType::Completion => "Completion",
        }
    }

    /// Prefix used when deriving the human-shareable credential number.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            CertificateType::Subject => "SUB",
            CertificateType::Semester => "SEM",
            CertificateType::Roadmap => "RDM",
            CertificateType::Completion => "CPL",
        }
    }
}

/// Off-chain approval state of a credential request.
///
/// Transitions are monotonic: `Pending` is only re-entered by the
/// rollback from `Approving` before anything was broadcast.
/// `ApprovedOffChain` and `Rejected` are terminal; `IssuedUnconfirmed`
/// resolves only through explicit reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    /// Transient lock taken while the issuance pipeline runs. A request
    /// left in this state with a recorded hash is awaiting reconciliation.
    Approving,
    /// Admin approved without an on-chain issuance. Terminal.
    ApprovedOffChain,
    Rejected,
    Issued,
    /// The transaction succeeded but the expected event was missing.
    /// Requires manual reconciliation; never treated as success.
    IssuedUnconfirmed,
}

/// The off-chain record of which transaction/event confirmed a credential.
///
/// Created only after a receipt yielded a matching event; immutable once
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainLinkage {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub chain_id: u64,
    pub contract_address: Address,
    pub emitted_credential_id: u64,
}

/// A student's request for a credential, owned by the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub id: String,
    pub student_id: String,
    /// The student's ledger address, resolved by the university backend
    /// when the request is raised.
    pub student_address: Address,
    pub certificate_type: CertificateType,
    pub subject_ref: Option<String>,
    pub semester_ref: Option<String>,
    pub roadmap_ref: Option<String>,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub requested_at: u64,
    pub processed_at: Option<u64>,
    /// Hash of an in-flight or unconfirmed transaction, recorded so a
    /// reconciliation pass can resolve it without resubmission.
    pub pending_tx_hash: Option<TxHash>,
    pub linkage: Option<OnChainLinkage>,
    /// When the confirmed linkage was accepted by the university backend.
    /// `None` on an Issued request means delivery is still owed.
    pub backend_synced_at: Option<u64>,
}

impl CredentialRequest {
    pub fn new(
        student_id: String,
        student_address: Address,
        certificate_type: CertificateType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id,
            student_address,
            certificate_type,
            subject_ref: None,
            semester_ref: None,
            roadmap_ref: None,
            status: RequestStatus::Pending,
            admin_notes: None,
            rejection_reason: None,
            requested_at: unix_now(),
            processed_at: None,
            pending_tx_hash: None,
            linkage: None,
            backend_synced_at: None,
        }
    }

    /// The payload string recorded on-chain for this request.
    pub fn credential_data(&self) -> String {
        serde_json::json!({
            "studentId": self.student_id,
            "certificateType": self.certificate_type.as_str(),
            "subjectRef": self.subject_ref,
            "semesterRef": self.semester_ref,
            "roadmapRef": self.roadmap_ref,
        })
        .to_string()
    }
}

/// Ledger-mirrored status of an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Issued,
    Revoked,
}

/// Projection of an issued request, served to verifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// The numeric on-chain id emitted at issuance.
    pub credential_id: u64,
    /// The human-shareable identifier (e.g., "SUB-000042").
    pub credential_number: String,
    pub student_id: String,
    pub certificate_type: CertificateType,
    pub status: CredentialStatus,
    pub issue_date: u64,
    /// Content hash usable as an alternate public lookup key.
    pub verification_hash: String,
    pub linkage: OnChainLinkage,
    pub revoked_at: Option<u64>,
    pub revocation_reason: Option<String>,
    /// Hash of an in-flight revocation, recorded on timeout.
    pub pending_revoke_tx: Option<TxHash>,
}

impl Credential {
    /// Build the projection for a freshly confirmed issuance.
    pub fn from_issued_request(request: &CredentialRequest, linkage: OnChainLinkage) -> Self {
        let credential_number = format!(
            "{}-{:06}",
            request.certificate_type.number_prefix(),
            linkage.emitted_credential_id
        );
        let verification_hash = derive_verification_hash(
            &credential_number,
            &request.student_id,
            linkage.transaction_hash,
        );
        Self {
            credential_id: linkage.emitted_credential_id,
            credential_number,
            student_id: request.student_id.clone(),
            certificate_type: request.certificate_type,
            status: CredentialStatus::Issued,
            issue_date: unix_now(),
            verification_hash,
            linkage,
            revoked_at: None,
            revocation_reason: None,
            pending_revoke_tx: None,
        }
    }
}

/// Derive the public verification hash for a credential.
pub fn derive_verification_hash(
    credential_number: &str,
    student_id: &str,
    tx_hash: TxHash,
) -> String {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(credential_number.as_bytes());
    preimage.push(0);
    preimage.extend_from_slice(student_id.as_bytes());
    preimage.push(0);
    preimage.extend_from_slice(tx_hash.as_slice());
    format!("{:#x}", keccak256(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linkage(id: u64) -> OnChainLinkage {
        OnChainLinkage {
            transaction_hash: TxHash::repeat_byte(0xAA),
            block_number: Some(1000),
            chain_id: 31337,
            contract_address: Address::repeat_byte(0x11),
            emitted_credential_id: id,
        }
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = CredentialRequest::new(
            "SV001".to_string(),
            Address::repeat_byte(1),
            CertificateType::Subject,
        );
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.linkage.is_none());
        assert!(request.pending_tx_hash.is_none());
    }

    #[test]
    fn test_credential_projection() {
        let request = CredentialRequest::new(
            "SV001".to_string(),
            Address::repeat_byte(1),
            CertificateType::Subject,
        );
        let credential = Credential::from_issued_request(&request, linkage(42));
        assert_eq!(credential.credential_id, 42);
        assert_eq!(credential.credential_number, "SUB-000042");
        assert_eq!(credential.status, CredentialStatus::Issued);
        assert!(credential.verification_hash.starts_with("0x"));
    }

    #[test]
    fn test_verification_hash_is_stable() {
        let a = derive_verification_hash("SUB-000042", "SV001", TxHash::repeat_byte(0xAA));
        let b = derive_verification_hash("SUB-000042", "SV001", TxHash::repeat_byte(0xAA));
        let c = derive_verification_hash("SUB-000043", "SV001", TxHash::repeat_byte(0xAA));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_request_serde_round_trip() {
        let mut request = CredentialRequest::new(
            "SV001".to_string(),
            Address::repeat_byte(1),
            CertificateType::Roadmap,
        );
        request.linkage = Some(linkage(7));
        let json = serde_json::to_string(&request).unwrap();
        let decoded: CredentialRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.status, RequestStatus::Pending);
        assert_eq!(decoded.linkage.unwrap().emitted_credential_id, 7);
    }
}
