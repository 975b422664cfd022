//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_endpoint_rotations_total` (counter): RPC endpoint rotations
//! - `ledger_submissions_total` (counter): writes by `operation`, `outcome`
//! - `ledger_reads_total` (counter): reads by `outcome`
//! - `ledger_audit_documents_total` (counter): audit documents by `mode`
//! - `ledger_rpc_healthy` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording is a no-op until a recorder is installed.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn record_rotation() {
    ::metrics::counter!("ledger_endpoint_rotations_total").increment(1);
}

pub fn record_submission(operation: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "ledger_submissions_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_read(outcome: &'static str) {
    ::metrics::counter!("ledger_reads_total", "outcome" => outcome).increment(1);
}

pub fn record_audit_document(mode: &'static str) {
    ::metrics::counter!("ledger_audit_documents_total", "mode" => mode).increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    ::metrics::gauge!("ledger_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
