//! Service middleware for request tracking and metrics.
//!
//! ## Metric events
//!
//! - `request` - one per request: method, path, status, latency
//! - `claims_batch` - one per validated batch: key counts and latency
//!
//! Events are emitted through `tracing` on the `claims_middleware::metrics`
//! target so they can be aggregated from logs.

use std::time::{Duration, Instant};

use axum::{
    extract::{OriginalUri, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};

use crate::controller::BatchSummary;

/// Header carrying the request correlation id.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request_path(&request);

    let response = next.run(request).await;

    info!(
        target: "claims_middleware::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Path as the client sent it, before any nesting prefix was stripped.
fn request_path(request: &Request) -> String {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Request logging middleware that adds a correlation id and timing.
///
/// Reuses an incoming `X-Request-Id` when present and echoes the id back on
/// the response.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "claims_middleware::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}

/// Record the outcome counts of a validated batch.
pub fn record_claims_metrics(summary: BatchSummary, latency: Duration) {
    info!(
        target: "claims_middleware::metrics",
        metric_type = "claims_batch",
        total = summary.total,
        verified = summary.verified,
        failed = summary.failed,
        latency_ms = latency.as_millis() as u64,
        "claims_batch_metric"
    );
}
