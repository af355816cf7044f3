//! Shared application state for Axum routers.

use std::time::Instant;

use rsi_storage::Catalog;

use crate::config::ApiConfig;
use crate::routes::aggregate::FrontDoors;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Data access layer over the configured store.
    pub catalog: Catalog,
    /// Aggregate endpoints, each with its own cache.
    pub front_doors: FrontDoors,
    /// Include failure reasons in aggregate responses.
    pub expose_error_details: bool,
    pub start_time: Instant,
}

impl AppState {
    /// Build state with one fresh cache per front door.
    pub fn new(catalog: Catalog, config: &ApiConfig) -> Self {
        Self {
            catalog,
            front_doors: FrontDoors::from_config(&config.front_doors),
            expose_error_details: config.is_development(),
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(
    Catalog => catalog,
    FrontDoors => front_doors,
    Instant => start_time,
);
