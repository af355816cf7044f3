//! HTTP surface of the catalog: aggregate front doors, collection CRUD,
//! health checks and the optional Prometheus scrape.

pub mod aggregate;
pub mod health;
pub mod product;
pub mod reference;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use rsi_core::ReferenceKind;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use aggregate::{FrontDoor, FrontDoors, StaleReason};
pub use health::create_router as health_router;
pub use product::create_router as product_router;
pub use reference::create_router as reference_router;

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS open to any origin");
        return base.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    tracing::info!(origins = ?config.cors_origins, "CORS restricted");

    base.allow_origin(origins)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(config.cors_allow_credentials)
}

/// Full application router. Reference collections mount under
/// `/api/<slug>`, products under `/api/product`.
pub fn create_api_router(state: AppState, config: &ApiConfig, metrics_enabled: bool) -> Router {
    let mut router = Router::new();

    for door in state.front_doors.all() {
        router = router.route(
            door.path,
            aggregate::door_route(state.catalog.clone(), door, state.expose_error_details),
        );
    }

    for kind in ReferenceKind::ALL {
        router = router.nest(
            &format!("/api/{}", kind.slug()),
            reference::create_router(state.catalog.clone(), kind),
        );
    }

    router = router
        .nest("/api/product", product::create_router(state.clone()))
        .nest("/health", health::create_router(state));

    if metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}
