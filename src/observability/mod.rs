//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured tracing events (stdout, EnvFilter-controlled)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with field-level context on every event
//! - Metrics are cheap (atomic increments)
//! - The service keeps running if the metrics recorder fails to install

pub mod metrics;
