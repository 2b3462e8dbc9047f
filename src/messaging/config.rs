//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Messaging backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessagingBackend {
    /// Kafka - durable, partitioned event log
    #[default]
    Kafka,
    /// In-process channel with the same group and ack semantics
    InMemory,
}

impl MessagingBackend {
    /// Whether published events outlive the current process
    pub fn is_durable(&self) -> bool {
        matches!(self, MessagingBackend::Kafka)
    }
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Kafka bootstrap servers
    pub bootstrap_servers: String,

    /// Client ID
    pub client_id: String,

    /// Consumer group ID
    pub group_id: String,

    /// Session timeout in milliseconds
    pub session_timeout_ms: u64,

    /// Where a new group starts reading (earliest, latest)
    pub auto_offset_reset: String,

    /// Enable SASL authentication
    pub enable_sasl: bool,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password
    pub sasl_password: Option<String>,

    /// Enable SSL/TLS
    pub enable_ssl: bool,

    /// Compression type (none, gzip, snappy, lz4, zstd)
    pub compression_type: String,

    /// Message timeout in milliseconds
    pub message_timeout_ms: u64,

    /// Number of retries
    pub retries: u32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "civic-pulse".to_string(),
            group_id: "civic-pulse-group".to_string(),
            session_timeout_ms: 30000,
            auto_offset_reset: "earliest".to_string(),
            enable_sasl: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            enable_ssl: false,
            compression_type: "snappy".to_string(),
            message_timeout_ms: 30000,
            retries: 3,
        }
    }
}

/// Main messaging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Backend to use
    pub backend: MessagingBackend,

    /// Kafka configuration
    pub kafka: KafkaConfig,

    /// Topic carrying `IncidentReported` events
    pub topic: String,

    /// Enable dead letter topic
    pub enable_dlq: bool,

    /// Dead letter topic
    pub dlq_topic: String,

    /// Enable metrics
    pub enable_metrics: bool,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            backend: MessagingBackend::Kafka,
            kafka: KafkaConfig::default(),
            topic: "incident-reported".to_string(),
            enable_dlq: true,
            dlq_topic: "incident-reported.dlq".to_string(),
            enable_metrics: true,
        }
    }
}

impl MessagingConfig {
    /// Dead letter topic, if dead-lettering is enabled
    pub fn dead_letter_topic(&self) -> Option<&str> {
        self.enable_dlq.then_some(self.dlq_topic.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MessagingConfig::default();
        assert_eq!(config.backend, MessagingBackend::Kafka);
        assert_eq!(config.topic, "incident-reported");
        assert_eq!(config.kafka.group_id, "civic-pulse-group");
        assert_eq!(config.dead_letter_topic(), Some("incident-reported.dlq"));
    }

    #[test]
    fn test_dlq_disabled() {
        let config = MessagingConfig {
            enable_dlq: false,
            ..Default::default()
        };
        assert_eq!(config.dead_letter_topic(), None);
    }

    #[test]
    fn test_backend_durability() {
        assert!(MessagingBackend::Kafka.is_durable());
        assert!(!MessagingBackend::InMemory.is_durable());
    }
}
