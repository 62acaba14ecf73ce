//! Receipt log decoding.
//!
//! A mined transaction's receipt carries logs from every contract the
//! call touched. The extractor decodes each log against the known
//! interface, discards the ones that do not match (they may belong to
//! other contracts or events), and returns the first hit. A successful
//! receipt without the expected event is a real inconsistency and is
//! surfaced as [`ChainError::EventNotFound`], never swallowed.

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::sol_types::SolEvent;

use crate::chain::types::{ChainError, ChainResult};
use crate::contracts::abi;

/// Decode the first log matching event `E`, skipping undecodable logs.
pub fn find_event<E: SolEvent>(logs: &[Log]) -> Option<E> {
    for log in logs {
        if let Ok(decoded) = log.log_decode::<E>() {
            return Some(decoded.inner.data);
        }
    }
    None
}

/// A validated `CredentialIssued` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedEvent {
    pub credential_id: u64,
    pub student: Address,
    pub issued_by: Address,
}

/// A validated `CredentialRevoked` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokedEvent {
    pub credential_id: u64,
    pub revoked_by: Address,
    pub revoked_at: u64,
}

/// Extract and validate the issuance event from a successful receipt.
///
/// An emitted id of zero (or one that overflows the domain id width)
/// means the expected business event did not appear in usable form; that
/// is reported as `EventNotFound` and routed to manual reconciliation.
pub fn extract_issued(receipt: &TransactionReceipt) -> ChainResult<IssuedEvent> {
    extract_issued_from_logs(receipt.inner.logs(), receipt.transaction_hash)
}

pub fn extract_issued_from_logs(logs: &[Log], tx_hash: TxHash) -> ChainResult<IssuedEvent> {
    let not_found = || ChainError::EventNotFound {
        tx_hash,
        event: "CredentialIssued",
    };

    let event: abi::CredentialIssued = find_event(logs).ok_or_else(not_found)?;
    let credential_id = u64::try_from(event.credentialId).map_err(|_| not_found())?;
    if credential_id == 0 {
        return Err(not_found());
    }

    Ok(IssuedEvent {
        credential_id,
        student: event.studentAddress,
        issued_by: event.issuedBy,
    })
}

/// Extract and validate the revocation event from a successful receipt.
pub fn extract_revoked(receipt: &TransactionReceipt) -> ChainResult<RevokedEvent> {
    extract_revoked_from_logs(receipt.inner.logs(), receipt.transaction_hash)
}

pub fn extract_revoked_from_logs(logs: &[Log], tx_hash: TxHash) -> ChainResult<RevokedEvent> {
    let not_found = || ChainError::EventNotFound {
        tx_hash,
        event: "CredentialRevoked",
    };

    let event: abi::CredentialRevoked = find_event(logs).ok_or_else(not_found)?;
    let credential_id = u64::try_from(event.credentialId).map_err(|_| not_found())?;
    if credential_id == 0 {
        return Err(not_found());
    }

    Ok(RevokedEvent {
        credential_id,
        revoked_by: event.revokedBy,
        revoked_at: u64::try_from(event.revokedAt).unwrap_or(u64::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn rpc_log<E: SolEvent>(contract: Address, event: &E) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: contract,
                data: event.encode_log_data(),
            },
            block_hash: None,
            block_number: Some(1000),
            block_timestamp: None,
            transaction_hash: Some(TxHash::ZERO),
            transaction_index: None,
            log_index: None,
            removed: false,
        }
    }

    fn issued_log(credential_id: u64) -> Log {
        rpc_log(
            Address::repeat_byte(0xAA),
            &abi::CredentialIssued {
                credentialId: U256::from(credential_id),
                studentAddress: Address::repeat_byte(1),
                credentialType: "Subject".to_string(),
                issuedBy: Address::repeat_byte(2),
            },
        )
    }

    #[test]
    fn test_extract_issued() {
        let logs = vec![issued_log(42)];
        let event = extract_issued_from_logs(&logs, TxHash::ZERO).unwrap();
        assert_eq!(event.credential_id, 42);
        assert_eq!(event.student, Address::repeat_byte(1));
        assert_eq!(event.issued_by, Address::repeat_byte(2));
    }

    #[test]
    fn test_foreign_logs_are_skipped() {
        // A GradeApproved log from another module must not confuse the
        // issuance extractor.
        let foreign = rpc_log(
            Address::repeat_byte(0xBB),
            &abi::GradeApproved {
                gradeId: U256::from(7),
                approvedBy: Address::repeat_byte(3),
            },
        );
        let logs = vec![foreign, issued_log(42)];
        let event = extract_issued_from_logs(&logs, TxHash::ZERO).unwrap();
        assert_eq!(event.credential_id, 42);
    }

    #[test]
    fn test_missing_event_is_event_not_found() {
        let logs = vec![rpc_log(
            Address::repeat_byte(0xBB),
            &abi::GradeApproved {
                gradeId: U256::from(7),
                approvedBy: Address::repeat_byte(3),
            },
        )];
        let result = extract_issued_from_logs(&logs, TxHash::ZERO);
        assert!(matches!(
            result,
            Err(ChainError::EventNotFound {
                event: "CredentialIssued",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_credential_id_is_rejected() {
        let logs = vec![issued_log(0)];
        assert!(extract_issued_from_logs(&logs, TxHash::ZERO).is_err());
    }

    #[test]
    fn test_extract_revoked() {
        let logs = vec![rpc_log(
            Address::repeat_byte(0xAA),
            &abi::CredentialRevoked {
                credentialId: U256::from(42),
                revokedBy: Address::repeat_byte(2),
                revokedAt: U256::from(1_700_000_000u64),
            },
        )];
        let event = extract_revoked_from_logs(&logs, TxHash::ZERO).unwrap();
        assert_eq!(event.credential_id, 42);
        assert_eq!(event.revoked_at, 1_700_000_000);
    }
}
