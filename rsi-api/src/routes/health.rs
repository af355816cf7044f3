//! Health Check Endpoints
//!
//! - `/health/ping` answers `pong` without touching anything
//! - `/health/live` reports that the process is up
//! - `/health/ready` pings the catalog store and reports each front door's cache

use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use rsi_storage::Catalog;
use serde::{Deserialize, Serialize};

use crate::routes::aggregate::{FrontDoor, FrontDoors};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liveness {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
}

/// Body of `/health/ready`. Only the store check decides `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreCheck,
    pub caches: Vec<CacheReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCheck {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counters of one front door cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
    pub front_door: String,
    pub path: String,
    pub ttl_seconds: u64,
    pub hits: u64,
    pub refreshes: u64,
    pub failures: u64,
    pub coalesced: u64,
    pub hit_rate: f64,
}

impl CacheReport {
    fn of(door: &FrontDoor) -> Self {
        let stats = door.cache.stats();
        Self {
            front_door: door.name.to_string(),
            path: door.path.to_string(),
            ttl_seconds: door.cache.ttl().as_secs(),
            hits: stats.hits,
            refreshes: stats.refreshes,
            failures: stats.failures,
            coalesced: stats.coalesced,
            hit_rate: stats.hit_rate(),
        }
    }
}

async fn check_store(catalog: &Catalog) -> StoreCheck {
    let started = Instant::now();
    match catalog.store().ping().await {
        Ok(()) => StoreCheck {
            status: HealthStatus::Healthy,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness store ping failed");
            StoreCheck {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn liveness(State(start_time): State<Instant>) -> Json<Liveness> {
    Json(Liveness {
        status: HealthStatus::Healthy,
        uptime_seconds: start_time.elapsed().as_secs(),
    })
}

pub async fn readiness(
    State(catalog): State<Catalog>,
    State(front_doors): State<FrontDoors>,
    State(start_time): State<Instant>,
) -> (StatusCode, Json<Readiness>) {
    let store = check_store(&catalog).await;
    let status = store.status;
    let report = Readiness {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        store,
        caches: front_doors.all().into_iter().map(CacheReport::of).collect(),
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}
