//! RSI API - REST Layer for the Product Catalog
//!
//! Axum routes over the catalog in rsi-storage: reference collection and
//! product CRUD, plus the cached aggregate endpoints served to the
//! storefront deployments. PostgreSQL persistence lives in [`db`].

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, FrontDoorConfig};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::{create_api_router, FrontDoor, FrontDoors};
pub use state::AppState;
pub use types::*;
