//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by method, stage, outcome
//! - `router_dispatch_duration_seconds` (histogram): time spent selecting a route
//!
//! # Design Decisions
//! - Labels stay low-cardinality: no paths, no parameter values, and
//!   extension methods share the `other` label
//! - The duration covers matching only; handler time belongs to the handler

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::Stage;

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Methods reported under their own label; anything else is `other`.
const LABELLED_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "CONNECT", "TRACE",
];

fn method_label(method: &Method) -> &'static str {
    LABELLED_METHODS
        .iter()
        .copied()
        .find(|known| *known == method.as_str())
        .unwrap_or("other")
}

/// Record the outcome of one dispatch.
pub fn record_dispatch(method: &Method, stage: Stage, outcome: &'static str, start: Instant) {
    let method = method_label(method);
    let stage = stage.to_string();
    counter!(
        "router_dispatch_total",
        "method" => method,
        "stage" => stage.clone(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "router_dispatch_duration_seconds",
        "method" => method,
        "stage" => stage,
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}
