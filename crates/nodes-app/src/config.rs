//! Configuration for the Nodes demo
//!
//! This module contains the configuration type and its environment loading.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use nodes_core::StoreConfig;
use nodes_monitoring::LoggingConfig;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Undo history limit; `None` keeps everything
    #[serde(default)]
    pub max_undo_steps: Option<usize>,

    /// JSON document to persist to; in-memory storage when unset
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Seed the sample class when storage is empty
    #[serde(default = "default_seed_sample")]
    pub seed_sample: bool,

    /// Environment values that could not be parsed, reported once logging is up
    #[serde(skip)]
    pub rejected: Vec<String>,
}

fn default_log_filter() -> String {
    "info,nodes=debug".to_string()
}

fn default_seed_sample() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
            max_undo_steps: None,
            data_file: None,
            seed_sample: default_seed_sample(),
            rejected: Vec::new(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values keep their default and are recorded in
    /// [`AppConfig::rejected`].
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup("NODES_LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Some(json) = lookup("NODES_JSON_LOGS") {
            match parse_bool(&json) {
                Some(json) => config.json_logs = json,
                None => config.rejected.push(format!("Invalid NODES_JSON_LOGS value: {}", json)),
            }
        }

        if let Some(steps) = lookup("NODES_MAX_UNDO_STEPS") {
            match steps.trim().parse::<usize>() {
                Ok(steps) => config.max_undo_steps = Some(steps),
                Err(_) => config
                    .rejected
                    .push(format!("Invalid NODES_MAX_UNDO_STEPS value: {}", steps)),
            }
        }

        if let Some(path) = lookup("NODES_DATA_FILE").filter(|p| !p.trim().is_empty()) {
            config.data_file = Some(PathBuf::from(path));
        }

        if let Some(seed) = lookup("NODES_SEED_SAMPLE") {
            match parse_bool(&seed) {
                Some(seed) => config.seed_sample = seed,
                None => config.rejected.push(format!("Invalid NODES_SEED_SAMPLE value: {}", seed)),
            }
        }

        config
    }

    /// Logging settings derived from this configuration
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            service_name: "nodes".to_string(),
            log_filter: self.log_filter.clone(),
            enable_json_logging: self.json_logs,
        }
    }

    /// Store settings derived from this configuration
    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            max_undo_steps: self.max_undo_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::load_from(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(load(&[]), AppConfig::default());
        assert_eq!(AppConfig::default().store().max_undo_steps, None);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = load(&[
            ("NODES_LOG_FILTER", "warn"),
            ("NODES_JSON_LOGS", "TRUE"),
            ("NODES_MAX_UNDO_STEPS", "25"),
            ("NODES_DATA_FILE", "/tmp/classroom.json"),
            ("NODES_SEED_SAMPLE", "0"),
        ]);

        assert_eq!(config.log_filter, "warn");
        assert!(config.json_logs);
        assert_eq!(config.max_undo_steps, Some(25));
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/classroom.json")));
        assert!(!config.seed_sample);
        assert!(config.rejected.is_empty());
        assert!(config.logging().enable_json_logging);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = load(&[
            ("NODES_JSON_LOGS", "maybe"),
            ("NODES_MAX_UNDO_STEPS", "-3"),
            ("NODES_SEED_SAMPLE", "sometimes"),
        ]);

        assert!(!config.json_logs);
        assert_eq!(config.max_undo_steps, None);
        assert!(config.seed_sample);
        assert_eq!(config.rejected.len(), 3);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "json_logs": true }"#).unwrap();
        assert!(config.json_logs);
        assert_eq!(config.log_filter, "info,nodes=debug");
        assert!(config.seed_sample);
    }
}
