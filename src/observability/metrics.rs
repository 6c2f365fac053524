//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_tasks_received_total` (counter): inbound messages turned into tasks
//! - `bridge_submissions_total` (counter): submissions by `outcome` (success/failure)
//! - `bridge_submission_duration_seconds` (histogram): ledger round-trip time
//! - `bridge_queue_depth` (gauge): tasks waiting or in flight
//! - `bridge_connection_state` (gauge): 0=disconnected 1=connecting 2=connected 3=reconnecting
//! - `bridge_reconnects_total` (counter): transport reconnect attempts
//!
//! Recording without an installed recorder is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_task_received() {
    metrics::counter!("bridge_tasks_received_total").increment(1);
}

pub fn record_submission(success: bool, started: Instant) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("bridge_submissions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("bridge_submission_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("bridge_queue_depth").set(depth as f64);
}

pub fn record_connection_state(code: u8) {
    metrics::gauge!("bridge_connection_state").set(code as f64);
}

pub fn record_reconnect() {
    metrics::counter!("bridge_reconnects_total").increment(1);
}
