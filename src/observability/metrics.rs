//! Metrics collection and exposition.
//!
//! # Metrics
//! - `higlass_proxy_requests_total` (counter): requests by method, status, outcome
//! - `higlass_proxy_request_duration_seconds` (histogram): latency by outcome
//!
//! Outcomes are `ok`, `timeout`, `error` and `rejected`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request. A no-op until a recorder is installed.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "higlass_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "higlass_proxy_request_duration_seconds",
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}
