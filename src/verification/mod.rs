//! Public credential verification.
//!
//! # Data Flow
//! ```text
//! GET /verify/{payload}
//!     → query.rs  (classify: URL / hash / credential number)
//!     → resolver.rs (store lookup, ledger validity tie-break)
//! ```
//!
//! This path never signs, never mutates, and never requires
//! authentication.

pub mod query;
pub mod resolver;

pub use query::VerificationQuery;
pub use resolver::{CredentialSummary, VerificationOutcome, VerificationResolver};
