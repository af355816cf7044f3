//! RSI API Server Entry Point
//!
//! Bootstraps configuration, prepares the PostgreSQL schema, and starts the
//! Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use rsi_api::telemetry::{init_tracing, TelemetryConfig};
use rsi_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbConfig, PgStore};
use rsi_storage::Catalog;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let db_config = DbConfig::from_env();

    let store = PgStore::from_config(&db_config)?;
    store.ensure_schema().await?;
    let catalog = Catalog::new(Arc::new(store));

    if api_config.seed_on_start {
        let inserted = catalog.seed_defaults().await?;
        tracing::info!(inserted, "Seed check complete");
    }

    let state = AppState::new(catalog, &api_config);
    for door in state.front_doors.all() {
        tracing::info!(
            front_door = door.name,
            path = door.path,
            ttl_secs = door.cache.ttl().as_secs(),
            "Aggregate front door ready"
        );
    }

    let app: Router = create_api_router(state, &api_config, telemetry_config.metrics_enabled);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, environment = %api_config.environment, "Starting RSI API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
