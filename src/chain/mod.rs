//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (signing key) + ChainConfig (RPC endpoints)
//!     → signer.rs (per-operation signing sessions)
//!     → client.rs (RPC reads with timeouts and failover)
//!     → guard.rs (expected-chain check before every write)
//!     → gateway.rs (broadcast, poll for inclusion, confirmations)
//!     → events.rs (decode receipt logs into domain events)
//!     → ledger.rs (the trait the rest of the service programs against)
//! ```
//!
//! # Security Constraints
//! - Signing keys ONLY from environment variables
//! - Never log key material
//! - All RPC calls have configurable timeouts
//! - Writes are refused when the connected chain id is unexpected

pub mod client;
pub mod events;
pub mod gateway;
pub mod guard;
pub mod ledger;
pub mod signer;
pub mod types;

pub use client::ChainClient;
pub use gateway::TxGateway;
pub use guard::NetworkGuard;
pub use ledger::{ChainCredentialLedger, CredentialLedger};
pub use signer::SigningSession;
pub use types::{ChainError, ChainId, ChainResult, TxOptions};
