//! Tracing subscriber initialization.

use piste_core::{ConfigError, PisteError, PisteResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "piste_engine=info,warn";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Filter directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `PISTE_LOG_JSON`: `true` or `1` for JSON output (default: false)
    /// - `PISTE_LOG_FILTER`: fallback filter directive (default: `piste_engine=info,warn`)
    pub fn from_env() -> Self {
        Self {
            json: std::env::var("PISTE_LOG_JSON")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
            filter: std::env::var("PISTE_LOG_FILTER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if the
/// filter does not parse or a subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> PisteResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| {
            PisteError::Config(ConfigError::InvalidValue {
                field: "PISTE_LOG_FILTER".to_string(),
                value: config.filter.clone(),
                reason: e.to_string(),
            })
        })?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| {
        PisteError::Config(ConfigError::InvalidValue {
            field: "tracing".to_string(),
            value: if config.json { "json" } else { "text" }.to_string(),
            reason: format!("Failed to init subscriber: {}", e),
        })
    })?;

    tracing::debug!(json = config.json, filter = %config.filter, "Telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert!(!config.json);
        assert_eq!(config.filter, "piste_engine=info,warn");
    }
}
