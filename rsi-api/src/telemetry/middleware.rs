//! Request span, access log and HTTP metrics.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;

use super::metrics::METRICS;

/// Route label for a concrete path: every id segment collapses to `:id`,
/// the same placeholder the routers use.
fn route_label(path: &str) -> String {
    let mut label = String::with_capacity(path.len());
    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            label.push('/');
        }
        if looks_like_id(segment) {
            label.push_str(":id");
        } else {
            label.push_str(segment);
        }
    }
    label
}

fn looks_like_id(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    segment.bytes().all(|b| b.is_ascii_digit()) || uuid::Uuid::try_parse(segment).is_ok()
}

pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = route_label(request.uri().path());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        route = %route,
        uri = %request.uri(),
    );

    let response = next.run(request).instrument(span.clone()).await;
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(method.as_str(), &route, status, elapsed.as_secs_f64());
    }

    span.in_scope(|| {
        if response.status().is_server_error() {
            tracing::warn!(status, elapsed_ms = elapsed.as_millis() as u64, "Request failed");
        } else {
            tracing::info!(status, elapsed_ms = elapsed.as_millis() as u64, "Request completed");
        }
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_segments_collapse() {
        assert_eq!(
            route_label("/api/origin/018f3a2b-7c4d-7e8f-9a0b-1c2d3e4f5a6b"),
            "/api/origin/:id"
        );
    }

    #[test]
    fn test_numeric_segments_collapse() {
        assert_eq!(route_label("/api/product/12345"), "/api/product/:id");
    }

    #[test]
    fn test_static_routes_unchanged() {
        assert_eq!(route_label("/apicpanel/data"), "/apicpanel/data");
        assert_eq!(route_label("/api/color/"), "/api/color/");
        assert_eq!(route_label("/"), "/");
    }
}
