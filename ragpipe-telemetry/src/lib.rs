//! # ragpipe-telemetry
//!
//! Process-wide `tracing` subscriber setup shared by the ragpipe binaries.
//!
//! `RUST_LOG` wins over the configured level when it is set.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging settings, usually read from the `telemetry` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `ragpipe_rag=debug,info`.
    pub level: String,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
}

fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|source| TelemetryError::Filter { directive: config.level.clone(), source })
}

/// Install the global subscriber.
///
/// Returns `Ok(true)` when this call installed it and `Ok(false)` when a
/// global subscriber was already set, in which case nothing changes.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] if `config.level` is not a valid
/// filter directive.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<bool, TelemetryError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    if installed {
        tracing::info!(level = %config.level, json = config.json, "logging initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config, TelemetryConfig { level: "info".to_string(), json: true });
    }

    #[test]
    fn invalid_level_is_rejected() {
        let config = TelemetryConfig { level: "ragpipe=loud".to_string(), json: false };
        let err = env_filter(&config);
        // RUST_LOG may be set in the environment running the tests.
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(err, Err(TelemetryError::Filter { .. })));
        }
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = TelemetryConfig::default();
        let first = init_telemetry(&config).unwrap();
        let second = init_telemetry(&config).unwrap();

        assert!(first);
        assert!(!second);
    }
}
