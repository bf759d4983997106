//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `store_operations_total` (counter): table calls by operation, outcome
//! - `store_operation_duration_seconds` (histogram): table call latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter the calls are no-ops
//! - Prometheus exporter serves its own listener, separate from the API

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::store::StoreOperation;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a table store call.
pub fn record_store_operation(operation: StoreOperation, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!(
        "store_operations_total",
        "operation" => operation.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("store_operation_duration_seconds", "operation" => operation.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Middleware recording every request that passes through the router.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;

    record_request(&method, response.status().as_u16(), start);
    response
}
