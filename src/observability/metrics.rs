//! Metrics collection and exposition.
//!
//! # Metrics
//! - `products_http_requests_total` (counter): requests by route, status
//! - `products_http_request_duration_seconds` (histogram): latency distribution by route
//! - `products_stage_outcomes_total` (counter): aggregation stage results by stage, outcome
//!
//! # Design Decisions
//! - The `metrics` facade is a no-op until a recorder is installed, so
//!   handlers record unconditionally
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus metrics exporter started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished HTTP request.
pub fn record_request(route: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        "products_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "products_http_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record the outcome of one aggregation stage.
pub fn record_stage(stage: &'static str, outcome: &'static str) {
    metrics::counter!(
        "products_stage_outcomes_total",
        "stage" => stage,
        "outcome" => outcome
    )
    .increment(1);
}

/// Middleware recording request count and latency per matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&route, response.status().as_u16(), start_time);
    response
}
