//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): completed requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency by method
//! - `gateway_auth_failures_total` (counter): rejected requests by failure kind
//! - `gateway_rate_limited_total` (counter): denied requests by key strategy
//! - `gateway_header_dedup_skipped_total` (counter): dedup steps that gave up
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so tests need no setup

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_auth_failure(kind: &'static str) {
    counter!("gateway_auth_failures_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited(strategy: &'static str) {
    counter!("gateway_rate_limited_total", "strategy" => strategy).increment(1);
}

pub fn record_dedup_skipped() {
    counter!("gateway_header_dedup_skipped_total").increment(1);
}
