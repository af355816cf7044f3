//! Prometheus metrics for the catalog API.
//!
//! All series live in the default registry and are scraped through
//! [`metrics_handler`].

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// Request latency buckets in seconds, 1ms to 10s.
const REQUEST_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Store latency buckets; the top bucket matches the default socket timeout.
const STORE_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 45.0];

/// Process-wide metrics, registered on first use.
pub static METRICS: Lazy<ApiResult<RsiMetrics>> = Lazy::new(RsiMetrics::new);

fn registration_failed(name: &str) -> impl FnOnce(prometheus::Error) -> ApiError + '_ {
    move |e| ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

pub struct RsiMetrics {
    /// labels: method, path, status
    pub requests: CounterVec,
    /// labels: method, path
    pub request_seconds: HistogramVec,
    /// labels: operation, collection, result
    pub store_operations: CounterVec,
    /// labels: operation, collection
    pub store_operation_seconds: HistogramVec,
    /// labels: front_door, outcome (refreshed, cached, stale, unavailable)
    pub aggregate_reads: CounterVec,
}

impl RsiMetrics {
    pub fn new() -> ApiResult<Self> {
        let requests = register_counter_vec!(
            "rsi_http_requests_total",
            "HTTP requests served",
            &["method", "path", "status"]
        )
        .map_err(registration_failed("rsi_http_requests_total"))?;

        let request_seconds = register_histogram_vec!(
            "rsi_http_request_duration_seconds",
            "HTTP request latency",
            &["method", "path"],
            REQUEST_BUCKETS.to_vec()
        )
        .map_err(registration_failed("rsi_http_request_duration_seconds"))?;

        let store_operations = register_counter_vec!(
            "rsi_db_operations_total",
            "Catalog store operations",
            &["operation", "collection", "result"]
        )
        .map_err(registration_failed("rsi_db_operations_total"))?;

        let store_operation_seconds = register_histogram_vec!(
            "rsi_db_operation_duration_seconds",
            "Catalog store operation latency",
            &["operation", "collection"],
            STORE_BUCKETS.to_vec()
        )
        .map_err(registration_failed("rsi_db_operation_duration_seconds"))?;

        let aggregate_reads = register_counter_vec!(
            "rsi_aggregate_reads_total",
            "Aggregate reads by front door and how they were served",
            &["front_door", "outcome"]
        )
        .map_err(registration_failed("rsi_aggregate_reads_total"))?;

        Ok(Self {
            requests,
            request_seconds,
            store_operations,
            store_operation_seconds,
            aggregate_reads,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.request_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_db_operation(
        &self,
        operation: &str,
        collection: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let result = if success { "ok" } else { "error" };
        self.store_operations
            .with_label_values(&[operation, collection, result])
            .inc();
        self.store_operation_seconds
            .with_label_values(&[operation, collection])
            .observe(duration_secs);
    }

    pub fn record_aggregate_read(&self, front_door: &str, outcome: &str) {
        self.aggregate_reads
            .with_label_values(&[front_door, outcome])
            .inc();
    }
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler() -> Response {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> &'static RsiMetrics {
        match METRICS.as_ref() {
            Ok(m) => m,
            Err(e) => panic!("metrics registration failed: {}", e),
        }
    }

    #[test]
    fn test_aggregate_reads_are_counted_per_outcome() {
        let m = metrics();
        let stale = m.aggregate_reads.with_label_values(&["metrics-test", "stale"]);
        let cached = m.aggregate_reads.with_label_values(&["metrics-test", "cached"]);
        let (stale_before, cached_before) = (stale.get(), cached.get());

        m.record_aggregate_read("metrics-test", "stale");
        m.record_aggregate_read("metrics-test", "stale");

        assert_eq!(stale.get() - stale_before, 2.0);
        assert_eq!(cached.get(), cached_before);
    }

    #[test]
    fn test_store_operations_split_by_result() {
        let m = metrics();
        m.record_db_operation("reference_list", "metrics-test", true, 0.005);
        m.record_db_operation("reference_list", "metrics-test", false, 0.010);

        let ok = m
            .store_operations
            .with_label_values(&["reference_list", "metrics-test", "ok"])
            .get();
        let failed = m
            .store_operations
            .with_label_values(&["reference_list", "metrics-test", "error"])
            .get();
        assert!(ok >= 1.0);
        assert!(failed >= 1.0);
    }

    #[tokio::test]
    async fn test_handler_exposes_registered_series() {
        metrics().record_http_request("GET", "/metrics-test", 200, 0.001);

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("rsi_http_requests_total"));
    }
}
