//! Typed call builders for the on-chain modules.
//!
//! Each binding validates argument shapes before encoding, so a bad call
//! fails fast with [`ChainError::InvalidArgument`] instead of a late
//! on-chain revert. No business logic lives here; the bindings only
//! marshal domain values into schema-faithful calldata.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::chain::types::{ChainError, ChainResult};
use crate::contracts::abi;

/// An encoded, ready-to-submit contract call.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// Target contract address.
    pub to: Address,
    /// ABI-encoded calldata.
    pub calldata: Bytes,
    /// Method name, for logs and error context.
    pub method: &'static str,
}

fn require_non_empty(
    method: &'static str,
    field: &str,
    value: &str,
) -> ChainResult<()> {
    if value.trim().is_empty() {
        return Err(ChainError::InvalidArgument {
            method,
            reason: format!("{} must not be empty", field),
        });
    }
    Ok(())
}

fn require_non_zero_address(
    method: &'static str,
    field: &str,
    value: Address,
) -> ChainResult<()> {
    if value == Address::ZERO {
        return Err(ChainError::InvalidArgument {
            method,
            reason: format!("{} must not be the zero address", field),
        });
    }
    Ok(())
}

fn require_positive_id(method: &'static str, field: &str, value: u64) -> ChainResult<()> {
    if value == 0 {
        return Err(ChainError::InvalidArgument {
            method,
            reason: format!("{} must be a positive integer", field),
        });
    }
    Ok(())
}

/// Binding for the CredentialManagement module.
#[derive(Debug, Clone, Copy)]
pub struct CredentialContract {
    address: Address,
}

impl CredentialContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Prepare an `issueCredential` call.
    ///
    /// `expires_at` is a unix timestamp; zero means the credential does
    /// not expire.
    pub fn issue_credential(
        &self,
        student: Address,
        credential_type: &str,
        credential_data: &str,
        expires_at: u64,
    ) -> ChainResult<PreparedCall> {
        const METHOD: &str = "issueCredential";
        require_non_zero_address(METHOD, "studentAddress", student)?;
        require_non_empty(METHOD, "credentialType", credential_type)?;
        require_non_empty(METHOD, "credentialData", credential_data)?;

        let call = abi::issueCredentialCall {
            studentAddress: student,
            credentialType: credential_type.to_string(),
            credentialData: credential_data.to_string(),
            expiresAt: U256::from(expires_at),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }

    /// Prepare a `revokeCredential` call.
    pub fn revoke_credential(&self, credential_id: u64) -> ChainResult<PreparedCall> {
        const METHOD: &str = "revokeCredential";
        require_positive_id(METHOD, "credentialId", credential_id)?;

        let call = abi::revokeCredentialCall {
            credentialId: U256::from(credential_id),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }

    /// Prepare the read-only `isCredentialValid` call.
    pub fn is_credential_valid(&self, credential_id: u64) -> ChainResult<PreparedCall> {
        const METHOD: &str = "isCredentialValid";
        require_positive_id(METHOD, "credentialId", credential_id)?;

        let call = abi::isCredentialValidCall {
            credentialId: U256::from(credential_id),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }
}

/// Binding for the GradeManagement module.
#[derive(Debug, Clone, Copy)]
pub struct GradeContract {
    address: Address,
}

impl GradeContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn record_grade(
        &self,
        class_id: u64,
        student: Address,
        component_name: &str,
        score: u64,
        max_score: u64,
    ) -> ChainResult<PreparedCall> {
        const METHOD: &str = "recordGrade";
        require_positive_id(METHOD, "classId", class_id)?;
        require_non_zero_address(METHOD, "studentAddress", student)?;
        require_non_empty(METHOD, "componentName", component_name)?;
        if score > max_score {
            return Err(ChainError::InvalidArgument {
                method: METHOD,
                reason: format!("score {} exceeds maxScore {}", score, max_score),
            });
        }

        let call = abi::recordGradeCall {
            classId: U256::from(class_id),
            studentAddress: student,
            componentName: component_name.to_string(),
            score: U256::from(score),
            maxScore: U256::from(max_score),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }

    pub fn approve_grade(&self, grade_id: u64) -> ChainResult<PreparedCall> {
        const METHOD: &str = "approveGrade";
        require_positive_id(METHOD, "gradeId", grade_id)?;

        let call = abi::approveGradeCall {
            gradeId: U256::from(grade_id),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }
}

/// Binding for the ClassManagement module.
#[derive(Debug, Clone, Copy)]
pub struct ClassContract {
    address: Address,
}

impl ClassContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_class(
        &self,
        class_code: &str,
        class_name: &str,
        lecturer: Address,
        start_date: u64,
        end_date: u64,
        max_students: u64,
    ) -> ChainResult<PreparedCall> {
        const METHOD: &str = "createClass";
        require_non_empty(METHOD, "classCode", class_code)?;
        require_non_empty(METHOD, "className", class_name)?;
        require_non_zero_address(METHOD, "lecturerAddress", lecturer)?;
        require_positive_id(METHOD, "maxStudents", max_students)?;
        if end_date <= start_date {
            return Err(ChainError::InvalidArgument {
                method: METHOD,
                reason: format!("endDate {} must be after startDate {}", end_date, start_date),
            });
        }

        let call = abi::createClassCall {
            classCode: class_code.to_string(),
            className: class_name.to_string(),
            lecturerAddress: lecturer,
            startDate: U256::from(start_date),
            endDate: U256::from(end_date),
            maxStudents: U256::from(max_students),
        };
        Ok(PreparedCall {
            to: self.address,
            calldata: call.abi_encode().into(),
            method: METHOD,
        })
    }
}
