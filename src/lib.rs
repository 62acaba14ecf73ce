//! Academic Credential Chain Service Library

pub mod chain;
pub mod config;
pub mod contracts;
pub mod credentials;
pub mod http;
pub mod observability;
pub mod verification;

pub use config::CredchainConfig;
pub use credentials::CredentialWorkflow;
pub use http::HttpServer;
pub use verification::VerificationResolver;
