//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (issuance outcomes, revocations, verifications)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track RPC provider and backend callback health
//!
//! # Metrics
//! - `credchain_issuances_total` (counter): by outcome (issued, timeout,
//!   unconfirmed, failed)
//! - `credchain_revocations_total` (counter): by outcome
//! - `credchain_verifications_total` (counter): by result
//! - `credchain_backend_sync_total` (counter): by success
//! - `credchain_rpc_health` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start its scrape endpoint.
///
/// Called once at startup; a second call would fail to install and is
/// logged rather than propagated, the service runs fine without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics recorder");
        }
    }
}

/// Record an issuance pipeline outcome.
pub fn record_issuance(outcome: &str) {
    counter!("credchain_issuances_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a revocation outcome.
pub fn record_revocation(outcome: &str) {
    counter!("credchain_revocations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a public verification result.
pub fn record_verification(result: &str) {
    counter!("credchain_verifications_total", "result" => result.to_string()).increment(1);
}

/// Record whether a backend linkage delivery succeeded.
pub fn record_backend_sync(success: bool) {
    let label = if success { "ok" } else { "failed" };
    counter!("credchain_backend_sync_total", "status" => label).increment(1);
}

/// Record RPC provider health (1 = healthy, 0 = unhealthy).
pub fn record_rpc_health(healthy: bool) {
    gauge!("credchain_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
