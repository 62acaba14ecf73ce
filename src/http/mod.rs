//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! public:  GET /healthz, GET /verify/{payload}
//!     → handlers.rs → verification::resolver
//!
//! admin (bearer token):
//!     POST /requests, GET /requests[/{id}]
//!     POST /requests/{id}/{approve,approve-off-chain,reject,reconcile}
//!     POST /credentials/{number}/revoke
//!     → handlers.rs → credentials::workflow
//! ```

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
