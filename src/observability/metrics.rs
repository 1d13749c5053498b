//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define request metrics (throughput, latency)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): requests by method, status
//! - `switchyard_request_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels stay low-cardinality: no paths or route names

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Install the Prometheus recorder with its HTTP listener on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one served request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("GET", 200, Instant::now());
    }
}
