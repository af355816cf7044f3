//! API Configuration Module
//!
//! Server, CORS and front-door cache settings. Configuration is loaded from
//! environment variables; an unset environment means production.

use std::net::SocketAddr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_DATA_TTL_SECS, DEFAULT_BIND_HOST, DEFAULT_CORS_MAX_AGE_SECS,
    DEFAULT_CPANEL_TTL_SECS, DEFAULT_ENVIRONMENT, DEFAULT_PORT, DEFAULT_VERCEL_TTL_SECS,
    DEVELOPMENT_ENVIRONMENT,
};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for the listener, CORS and the aggregate front doors.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // Server
    // ========================================================================
    /// Host to bind
    pub bind_host: String,

    /// Port to bind. `PORT` wins over `RSI_API_PORT`.
    pub port: u16,

    /// Deployment environment name ("development", "production", ...)
    pub environment: String,

    /// Insert default reference data into empty collections at startup
    pub seed_on_start: bool,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Front doors
    // ========================================================================
    pub front_doors: FrontDoorConfig,
}

/// Cache TTL of each aggregate front door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontDoorConfig {
    /// `/api/data`
    pub api_data_ttl: Duration,
    /// `/apivercel/data`
    pub vercel_ttl: Duration,
    /// `/apicpanel/data`
    pub cpanel_ttl: Duration,
}

impl Default for FrontDoorConfig {
    fn default() -> Self {
        Self {
            api_data_ttl: Duration::from_secs(DEFAULT_API_DATA_TTL_SECS),
            vercel_ttl: Duration::from_secs(DEFAULT_VERCEL_TTL_SECS),
            cpanel_ttl: Duration::from_secs(DEFAULT_CPANEL_TTL_SECS),
        }
    }
}

impl FrontDoorConfig {
    /// Read TTLs from the process environment.
    ///
    /// Environment variables:
    /// - `RSI_API_DATA_TTL_SECS` (default: 0)
    /// - `RSI_VERCEL_TTL_SECS` (default: 300)
    /// - `RSI_CPANEL_TTL_SECS` (default: 60)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            api_data_ttl: secs("RSI_API_DATA_TTL_SECS", DEFAULT_API_DATA_TTL_SECS),
            vercel_ttl: secs("RSI_VERCEL_TTL_SECS", DEFAULT_VERCEL_TTL_SECS),
            cpanel_ttl: secs("RSI_CPANEL_TTL_SECS", DEFAULT_CPANEL_TTL_SECS),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            seed_on_start: false,
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            front_doors: FrontDoorConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RSI_API_BIND`: Host to bind (default: 0.0.0.0)
    /// - `PORT` / `RSI_API_PORT`: Port to bind (default: 8887)
    /// - `RSI_ENVIRONMENT`: Deployment environment (default: production)
    /// - `RSI_SEED_ON_START`: "true" or "1" to seed empty collections
    /// - `RSI_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `RSI_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `RSI_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - front door TTLs, see [`FrontDoorConfig::from_env`]
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let bind_host = lookup("RSI_API_BIND").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let port = match lookup("PORT").or_else(|| lookup("RSI_API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ApiError::invalid_input(format!("Invalid port value: {}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let environment = lookup("RSI_ENVIRONMENT")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let seed_on_start = lookup("RSI_SEED_ON_START")
            .map(|s| s == "true" || s == "1")
            .unwrap_or(false);

        let cors_origins = lookup("RSI_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("RSI_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = lookup("RSI_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        Ok(Self {
            bind_host,
            port,
            environment,
            seed_on_start,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            front_doors: FrontDoorConfig::from_lookup(lookup),
        })
    }

    /// Development mode exposes failure details in aggregate responses.
    pub fn is_development(&self) -> bool {
        self.environment == DEVELOPMENT_ENVIRONMENT
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }
}
