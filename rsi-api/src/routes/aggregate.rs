//! Aggregate Data Routes
//!
//! Each front door (`/api/data`, `/apivercel/data`, `/apicpanel/data`)
//! owns its own [`AggregateCache`]; they never share cached state.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json,
};
use rsi_storage::{AggregateCache, AggregateRead, Catalog};

use crate::config::FrontDoorConfig;
use crate::constants::{API_DATA_PATH, CPANEL_DATA_PATH, VERCEL_DATA_PATH};
use crate::telemetry::METRICS;
use crate::types::{AggregateResponse, DataUnavailableResponse};

// ============================================================================
// FRONT DOORS
// ============================================================================

/// Whether a stale response names the refresh failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// `"Using cached data due to: <error>"` in every environment
    Always,
    /// Only when error details are exposed (development)
    WhenExposed,
    /// Always the bare `"Using cached data"`
    Never,
}

impl StaleReason {
    fn reveals(self, expose_error_details: bool) -> bool {
        match self {
            StaleReason::Always => true,
            StaleReason::WhenExposed => expose_error_details,
            StaleReason::Never => false,
        }
    }
}

/// One aggregate endpoint and the cache dedicated to it.
#[derive(Debug, Clone)]
pub struct FrontDoor {
    /// Label used in logs and metrics
    pub name: &'static str,
    /// Route path
    pub path: &'static str,
    pub stale_reason: StaleReason,
    pub cache: Arc<AggregateCache>,
}

impl FrontDoor {
    pub fn new(
        name: &'static str,
        path: &'static str,
        ttl: Duration,
        stale_reason: StaleReason,
    ) -> Self {
        Self {
            name,
            path,
            stale_reason,
            cache: Arc::new(AggregateCache::new(ttl)),
        }
    }
}

/// The three aggregate endpoints.
#[derive(Debug, Clone)]
pub struct FrontDoors {
    pub api: FrontDoor,
    pub vercel: FrontDoor,
    pub cpanel: FrontDoor,
}

impl FrontDoors {
    pub fn from_config(config: &FrontDoorConfig) -> Self {
        Self {
            api: FrontDoor::new(
                "api",
                API_DATA_PATH,
                config.api_data_ttl,
                StaleReason::WhenExposed,
            ),
            vercel: FrontDoor::new(
                "vercel",
                VERCEL_DATA_PATH,
                config.vercel_ttl,
                StaleReason::Never,
            ),
            cpanel: FrontDoor::new(
                "cpanel",
                CPANEL_DATA_PATH,
                config.cpanel_ttl,
                StaleReason::Always,
            ),
        }
    }

    pub fn all(&self) -> [&FrontDoor; 3] {
        [&self.api, &self.vercel, &self.cpanel]
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

#[derive(Clone)]
pub struct AggregateState {
    pub catalog: Catalog,
    pub door: FrontDoor,
    /// Include failure reasons in responses (development only)
    pub expose_error_details: bool,
}

// ============================================================================
// RESPONSE BUILDING
// ============================================================================

/// Seconds left, rounded to the nearest second.
fn format_next_update(expires_in: Duration) -> String {
    format!("{}s", (expires_in.as_millis() + 500) / 1000)
}

/// Map a cache read onto the HTTP body.
///
/// `stale_reason` decides the stale message; `expose_error_details` decides
/// whether a cold failure carries `details`. `Err` carries the cold-failure
/// body served with status 500.
pub fn aggregate_response(
    read: AggregateRead,
    stale_reason: StaleReason,
    expose_error_details: bool,
) -> Result<AggregateResponse, DataUnavailableResponse> {
    let (snapshot, cached, next_update_in, error) = match read {
        AggregateRead::Refreshed(snapshot) => (snapshot, false, None, None),
        AggregateRead::Cached {
            snapshot,
            expires_in,
        } => (snapshot, true, Some(format_next_update(expires_in)), None),
        AggregateRead::Stale { snapshot, error } => {
            let message = if stale_reason.reveals(expose_error_details) {
                format!("Using cached data due to: {}", error)
            } else {
                "Using cached data".to_string()
            };
            (snapshot, true, None, Some(message))
        }
        AggregateRead::Unavailable { error } => {
            let details = expose_error_details.then(|| error.to_string());
            return Err(DataUnavailableResponse::new(details));
        }
    };

    let refs = &snapshot.references;
    Ok(AggregateResponse {
        products: snapshot.products.clone(),
        origins: refs.origins.clone(),
        colors: refs.colors.clone(),
        types: refs.types.clone(),
        categories: refs.categories.clone(),
        raw_materials: refs.raw_materials.clone(),
        manufactoring_processes: refs.processes.clone(),
        cached,
        last_updated: Some(snapshot.captured_at),
        next_update_in,
        error,
    })
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET {front door path} - Every collection in one response
pub async fn read_aggregate(State(state): State<Arc<AggregateState>>) -> Response {
    let read = state.door.cache.read(&state.catalog).await;

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_aggregate_read(state.door.name, read.outcome());
    }
    tracing::debug!(
        front_door = state.door.name,
        outcome = read.outcome(),
        "Aggregate read"
    );

    match aggregate_response(read, state.door.stale_reason, state.expose_error_details) {
        Ok(body) => Json(body).into_response(),
        Err(body) => (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response(),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Method router for one front door, carrying its own state.
pub fn door_route<S>(
    catalog: Catalog,
    door: &FrontDoor,
    expose_error_details: bool,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = Arc::new(AggregateState {
        catalog,
        door: door.clone(),
        expose_error_details,
    });
    get(read_aggregate).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rsi_core::{AggregateSnapshot, CatalogError, ReferenceItem, References};

    fn snapshot() -> Arc<AggregateSnapshot> {
        let mut references = References::default();
        references.origins = vec![ReferenceItem::new("India").unwrap()];
        Arc::new(AggregateSnapshot::assemble(&[], references, Utc::now()))
    }

    #[test]
    fn test_next_update_rounds_to_seconds() {
        assert_eq!(format_next_update(Duration::from_millis(59_400)), "59s");
        assert_eq!(format_next_update(Duration::from_millis(59_500)), "60s");
        assert_eq!(format_next_update(Duration::ZERO), "0s");
    }

    #[test]
    fn test_refreshed_response() {
        let body =
            aggregate_response(AggregateRead::Refreshed(snapshot()), StaleReason::Never, false)
                .unwrap();
        assert!(!body.cached);
        assert!(body.last_updated.is_some());
        assert!(body.next_update_in.is_none());
        assert_eq!(body.origins[0].display_name, "India");
    }

    fn stale_read() -> AggregateRead {
        AggregateRead::Stale {
            snapshot: snapshot(),
            error: CatalogError::unavailable("connection refused"),
        }
    }

    fn stale_message(policy: StaleReason, expose_error_details: bool) -> String {
        let body = aggregate_response(stale_read(), policy, expose_error_details).unwrap();
        assert!(body.cached);
        body.error.unwrap_or_default()
    }

    #[test]
    fn test_stale_reason_follows_environment_when_exposed() {
        assert_eq!(
            stale_message(StaleReason::WhenExposed, false),
            "Using cached data"
        );
        let message = stale_message(StaleReason::WhenExposed, true);
        assert!(message.starts_with("Using cached data due to: "));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_stale_reason_fixed_policies_ignore_environment() {
        for expose in [false, true] {
            assert!(stale_message(StaleReason::Always, expose)
                .starts_with("Using cached data due to: "));
            assert_eq!(stale_message(StaleReason::Never, expose), "Using cached data");
        }
    }

    #[test]
    fn test_cold_failure_details_only_in_development() {
        let read = AggregateRead::Unavailable {
            error: CatalogError::unavailable("connection refused"),
        };
        let err = aggregate_response(read.clone(), StaleReason::Always, false).unwrap_err();
        assert_eq!(err.error, "Data unavailable");
        assert!(err.details.is_none());

        let err = aggregate_response(read, StaleReason::Never, true).unwrap_err();
        assert!(err.details.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_response_uses_wire_field_names() {
        let body = aggregate_response(
            AggregateRead::Cached {
                snapshot: snapshot(),
                expires_in: Duration::from_secs(42),
            },
            StaleReason::WhenExposed,
            false,
        )
        .unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["cached"], true);
        assert_eq!(json["nextUpdateIn"], "42s");
        assert!(json["manufactoringProcesses"].is_array());
        assert!(json["rawMaterials"].is_array());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_front_doors_have_independent_caches() {
        let doors = FrontDoors::from_config(&FrontDoorConfig::default());
        assert!(!Arc::ptr_eq(&doors.vercel.cache, &doors.cpanel.cache));
        assert_eq!(doors.vercel.cache.ttl(), Duration::from_secs(300));
        assert_eq!(doors.cpanel.cache.ttl(), Duration::from_secs(60));
        assert_eq!(doors.api.cache.ttl(), Duration::ZERO);
        assert_eq!(doors.cpanel.stale_reason, StaleReason::Always);
        assert_eq!(doors.vercel.stale_reason, StaleReason::Never);
        let paths: Vec<_> = doors.all().iter().map(|d| d.path).collect();
        assert_eq!(paths, vec!["/api/data", "/apivercel/data", "/apicpanel/data"]);
    }
}
