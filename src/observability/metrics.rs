//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define request metrics (count, latency, recovered faults)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `sprig_requests_total` (counter): requests by method, status
//! - `sprig_request_duration_seconds` (histogram): latency distribution
//! - `sprig_recovered_faults_total` (counter): faults caught by recovery
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels kept low-cardinality: no paths, only methods and status codes

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("sprig_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    metrics::histogram!("sprig_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record one fault intercepted by the recovery boundary.
pub fn record_recovered_fault() {
    metrics::counter!("sprig_recovered_faults_total").increment(1);
}
