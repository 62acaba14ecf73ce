//! Credential lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! admin action (HTTP)
//!     → workflow.rs (status check-and-set, pipeline orchestration)
//!     → chain::ledger (issue / revoke / probe)
//!     → store.rs (requests + issued projections, source of truth)
//!     → notifier.rs (push confirmed linkage to the university backend)
//! ```
//!
//! The workflow module exclusively owns request and credential lifecycle;
//! nothing else mutates them.

pub mod model;
pub mod notifier;
pub mod store;
pub mod workflow;

pub use model::{
    CertificateType, Credential, CredentialRequest, CredentialStatus, OnChainLinkage,
    RequestStatus,
};
pub use store::CredentialStore;
pub use workflow::{CredentialWorkflow, ReconcileOutcome, WorkflowError};
