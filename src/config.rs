use crate::classifier::ClassifierConfig;
use crate::enrichment::EnrichmentConfig;
use crate::messaging::MessagingConfig;
use crate::outbox::OutboxConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// State backend configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Event channel configuration
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Classification endpoint configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Enrichment worker configuration
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Outbox relay configuration
    #[serde(default)]
    pub outbox: OutboxConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/civic-pulse.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CIVIC_PULSE_)
            .add_source(
                config::Environment::with_prefix("CIVIC_PULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// Path for the embedded database
    #[serde(default = "default_state_path")]
    pub path: Option<PathBuf>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

fn default_state_path() -> Option<PathBuf> {
    Some(PathBuf::from("./data/state"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_log_level(), "info");
        assert!(default_true());

        let config = Config::default();
        assert_eq!(config.state.backend, StateBackend::Sled);
        assert_eq!(config.state.path, Some(PathBuf::from("./data/state")));
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.messaging.topic, "incident-reported");
        assert_eq!(config.messaging.kafka.group_id, "civic-pulse-group");
        assert_eq!(config.enrichment.workers, 2);
    }
}
