//! Defaults for every `RSI_*` setting, plus the fixed aggregate paths.

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8887;

pub const DEFAULT_ENVIRONMENT: &str = "production";

/// The only environment whose responses carry failure details
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

// ============================================================================
// CORS
// ============================================================================

/// One day
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// AGGREGATE FRONT DOORS
// ============================================================================

pub const API_DATA_PATH: &str = "/api/data";

pub const VERCEL_DATA_PATH: &str = "/apivercel/data";

pub const CPANEL_DATA_PATH: &str = "/apicpanel/data";

/// Zero: `/api/data` refreshes on every call
pub const DEFAULT_API_DATA_TTL_SECS: u64 = 0;

pub const DEFAULT_VERCEL_TTL_SECS: u64 = 300;

pub const DEFAULT_CPANEL_TTL_SECS: u64 = 60;

// ============================================================================
// DATABASE
// ============================================================================

pub const DEFAULT_DB_NAME: &str = "rsi";

pub const DEFAULT_DB_POOL_SIZE: usize = 5;

/// Wait for a pooled connection
pub const DEFAULT_DB_SELECTION_TIMEOUT_SECS: u64 = 30;

/// Per statement
pub const DEFAULT_DB_SOCKET_TIMEOUT_SECS: u64 = 45;
