//! Dispatch metrics.
//!
//! # Metrics
//! - `rest_requests_total` (counter): finished requests by method, status, route
//! - `rest_request_duration_seconds` (histogram): dispatch latency
//! - `rest_not_found_total` (counter): requests that matched no route
//! - `rest_unresolved_total` (counter): requests a hook or handler never finished

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "rest_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "rest_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_not_found() {
    metrics::counter!("rest_not_found_total").increment(1);
}

pub fn record_unresolved(route: &str) {
    metrics::counter!("rest_unresolved_total", "route" => route.to_string()).increment(1);
}
