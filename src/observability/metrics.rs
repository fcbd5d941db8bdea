//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): admission outcomes by `outcome`
//! - `gate_malformed_requests_total` (counter): requests refused with 400
//! - `gate_tracked_sessions` (gauge): clients currently holding a session
//! - `gate_sessions_swept_total` (counter): expired sessions removed
//! - `gate_evaluation_duration_seconds` (histogram): time spent deciding
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::admission::Decision;
use crate::observability::ObservabilityError;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), ObservabilityError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ObservabilityError::Metrics(e.to_string()))?;

    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}

pub fn record_decision(decision: Decision, started: Instant) {
    metrics::counter!("gate_decisions_total", "outcome" => decision.as_str()).increment(1);
    metrics::histogram!("gate_evaluation_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn record_malformed_request() {
    metrics::counter!("gate_malformed_requests_total").increment(1);
}

pub fn record_tracked_sessions(count: usize) {
    metrics::gauge!("gate_tracked_sessions").set(count as f64);
}

pub fn record_sessions_swept(count: usize) {
    metrics::counter!("gate_sessions_swept_total").increment(count as u64);
}
