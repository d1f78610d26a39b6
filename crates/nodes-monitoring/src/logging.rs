//! Structured logging setup using tracing.
//!
//! Pretty, human-readable output for local runs; JSON lines when the logs
//! are shipped somewhere.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info,nodes=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of pretty output
    pub enable_json_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "nodes".to_string(),
            log_filter: "info,nodes=debug".to_string(),
            enable_json_logging: false,
        }
    }
}

impl LoggingConfig {
    /// Filter from `RUST_LOG`, falling back to the configured directive
    pub fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.log_filter)
                .with_context(|| format!("Invalid log filter '{}'", self.log_filter)),
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = config.env_filter()?;

    let json_layer = config.enable_json_logging.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let pretty_layer = (!config.enable_json_logging).then(|| {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.enable_json_logging { "json" } else { "pretty" },
        "Logging initialized"
    );

    Ok(())
}

/// Trait to add log context to results
pub trait LogExt<T, E> {
    /// Log the error with a message before returning it
    fn log_err(self, message: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_err(self, message: &str) -> Result<T, E> {
        if let Err(ref e) = self {
            tracing::error!("{}: {}", message, e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.service_name, "nodes");
        assert_eq!(config.log_filter, "info,nodes=debug");
        assert!(!config.enable_json_logging);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            log_filter: "nodes=[".to_string(),
            ..LoggingConfig::default()
        };
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_log_err_passes_result_through() {
        let ok: Result<u8, String> = Ok(3);
        assert_eq!(ok.log_err("unused"), Ok(3));

        let err: Result<u8, String> = Err("boom".to_string());
        assert_eq!(err.log_err("Persisting failed"), Err("boom".to_string()));
    }
}
