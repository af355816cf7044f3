//! Global `tracing` subscriber setup.

use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::DEFAULT_ENVIRONMENT;
use crate::error::{ApiError, ApiResult};

/// Used when `RUST_LOG` is unset or does not parse.
const DEFAULT_FILTER: &str = "rsi_api=debug,rsi_storage=debug,tower_http=debug,info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable, for local runs
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(ApiError::invalid_value("RSI_LOG_FORMAT", "expected json or pretty")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
    pub log_format: LogFormat,
    /// Serve `/metrics` and record Prometheus series
    pub metrics_enabled: bool,
}

impl TelemetryConfig {
    /// Reads `RSI_SERVICE_NAME`, `RSI_ENVIRONMENT`, `RSI_LOG_FORMAT`
    /// (json | pretty, default json) and `RSI_METRICS_ENABLED` (default on).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_format = match lookup("RSI_LOG_FORMAT").map(|raw| raw.parse::<LogFormat>()) {
            Some(Ok(format)) => format,
            _ => LogFormat::Json,
        };
        let metrics_enabled = lookup("RSI_METRICS_ENABLED")
            .map(|raw| !matches!(raw.trim(), "false" | "0" | "off"))
            .unwrap_or(true);

        Self {
            service_name: lookup("RSI_SERVICE_NAME").unwrap_or_else(|| "rsi-api".to_string()),
            environment: lookup("RSI_ENVIRONMENT")
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            log_format,
            metrics_enabled,
        }
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
    .map_err(|e| ApiError::internal_error(format!("Tracing already initialized: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        format = ?config.log_format,
        metrics = config.metrics_enabled,
        "Logging ready"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> TelemetryConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.service_name, "rsi-api");
        assert_eq!(config.environment, "production");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("RSI_LOG_FORMAT", "Pretty"),
            ("RSI_METRICS_ENABLED", "false"),
            ("RSI_ENVIRONMENT", "development"),
        ]);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.metrics_enabled);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_unknown_log_format_falls_back_to_json() {
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(config_from(&[("RSI_LOG_FORMAT", "xml")]).log_format, LogFormat::Json);
        assert_eq!(" TEXT ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }
}
