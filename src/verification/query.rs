//! Verification input classification.
//!
//! A public verifier can hand us anything a QR code or a shared link
//! contains: a full verification URL, a bare verification hash, or a bare
//! credential number. Classification is deterministic:
//!
//! - a well-formed http(s) URL yields the credential number from its
//!   `credentialNumber` query parameter (or last path segment) and an
//!   optional `verificationHash` parameter;
//! - a `0x`-prefixed hex token is a verification hash;
//! - any other non-empty string is a literal credential number.

use thiserror::Error;
use url::Url;

/// Nothing resembling a credential number or hash could be derived.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no credential number or verification hash in input: {0}")]
pub struct InvalidVerificationInput(pub String);

/// Ephemeral lookup input; at least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationQuery {
    pub credential_number: Option<String>,
    pub verification_hash: Option<String>,
}

impl VerificationQuery {
    /// Classify a raw QR/link payload.
    pub fn parse(raw: &str) -> Result<Self, InvalidVerificationInput> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidVerificationInput(raw.to_string()));
        }

        if let Ok(url) = Url::parse(trimmed) {
            if matches!(url.scheme(), "http" | "https") {
                return Self::from_url(&url)
                    .ok_or_else(|| InvalidVerificationInput(raw.to_string()));
            }
        }

        if is_hex_token(trimmed) {
            return Ok(Self {
                credential_number: None,
                verification_hash: Some(trimmed.to_ascii_lowercase()),
            });
        }

        Ok(Self {
            credential_number: Some(trimmed.to_string()),
            verification_hash: None,
        })
    }

    fn from_url(url: &Url) -> Option<Self> {
        let mut credential_number = None;
        let mut verification_hash = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "credentialNumber" if !value.trim().is_empty() => {
                    credential_number = Some(value.trim().to_string());
                }
                "verificationHash" if !value.trim().is_empty() => {
                    verification_hash = Some(value.trim().to_ascii_lowercase());
                }
                _ => {}
            }
        }

        if credential_number.is_none() {
            // Fall back to the last non-empty path segment.
            if let Some(segments) = url.path_segments() {
                let last = segments.filter(|s| !s.is_empty()).next_back();
                if let Some(segment) = last {
                    if segment != "verify" {
                        credential_number = Some(segment.to_string());
                    }
                }
            }
        }

        if credential_number.is_none() && verification_hash.is_none() {
            return None;
        }
        Some(Self {
            credential_number,
            verification_hash,
        })
    }
}

fn is_hex_token(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("0x") else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_both_parameters() {
        let query = VerificationQuery::parse(
            "https://host/verify?credentialNumber=SUB-2024-000123&verificationHash=0xabc",
        )
        .unwrap();
        assert_eq!(query.credential_number.as_deref(), Some("SUB-2024-000123"));
        assert_eq!(query.verification_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_url_path_segment() {
        let query = VerificationQuery::parse("https://host/verify/SUB-000042").unwrap();
        assert_eq!(query.credential_number.as_deref(), Some("SUB-000042"));
        assert!(query.verification_hash.is_none());
    }

    #[test]
    fn test_bare_hex_is_hash_not_number() {
        let query =
            VerificationQuery::parse("0x1a2b3c4d5e6f7890abcdef1234567890abcdef12").unwrap();
        assert!(query.credential_number.is_none());
        assert_eq!(
            query.verification_hash.as_deref(),
            Some("0x1a2b3c4d5e6f7890abcdef1234567890abcdef12")
        );
    }

    #[test]
    fn test_bare_string_is_credential_number() {
        let query = VerificationQuery::parse("SUB-000042").unwrap();
        assert_eq!(query.credential_number.as_deref(), Some("SUB-000042"));
        assert!(query.verification_hash.is_none());
    }

    #[test]
    fn test_0x_with_non_hex_is_literal_number() {
        // Looks hash-like but is not valid hex, so it is treated as a
        // literal identifier rather than rejected.
        let query = VerificationQuery::parse("0xZZZ").unwrap();
        assert_eq!(query.credential_number.as_deref(), Some("0xZZZ"));
    }

    #[test]
    fn test_empty_input_is_invalid() {
        assert!(VerificationQuery::parse("   ").is_err());
    }

    #[test]
    fn test_bare_verify_url_is_invalid() {
        assert!(VerificationQuery::parse("https://host/verify").is_err());
    }
}
