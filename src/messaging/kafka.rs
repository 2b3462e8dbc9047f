//! Kafka message queue implementation

use crate::messaging::config::KafkaConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::events::ReceivedMessage;
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;

/// Apply SASL/SSL settings shared by producers and consumers
fn apply_security(client_config: &mut ClientConfig, config: &KafkaConfig) {
    if config.enable_sasl {
        if let (Some(mechanism), Some(username), Some(password)) = (
            &config.sasl_mechanism,
            &config.sasl_username,
            &config.sasl_password,
        ) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanism", mechanism)
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
    } else if config.enable_ssl {
        client_config.set("security.protocol", "SSL");
    }
}

/// Kafka producer
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    config: KafkaConfig,
}

impl KafkaProducer {
    /// Create a new Kafka producer
    pub fn new(config: KafkaConfig) -> MessagingResult<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("compression.type", &config.compression_type)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("retries", config.retries.to_string())
            .set("enable.idempotence", "true");

        apply_security(&mut client_config, &config);

        let producer: FutureProducer = client_config.create().map_err(|e| {
            MessagingError::ConfigurationError(format!("Kafka producer creation failed: {}", e))
        })?;

        Ok(Self {
            producer: Arc::new(producer),
            config,
        })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        let record: FutureRecord<'_, str, [u8]> =
            FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, Duration::from_millis(self.config.message_timeout_ms))
            .await
            .map_err(|(e, _)| {
                MessagingError::PublishFailed(format!("Kafka publish failed: {}", e))
            })?;

        Ok(())
    }

    async fn close(&self) -> MessagingResult<()> {
        let producer = self.producer.clone();
        let timeout = Duration::from_millis(self.config.message_timeout_ms);

        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| MessagingError::PublishFailed(format!("Kafka flush task failed: {}", e)))?
            .map_err(|e| MessagingError::PublishFailed(format!("Kafka flush failed: {}", e)))
    }
}

/// Kafka consumer factory; every subscription is a separate group member
pub struct KafkaConsumer {
    config: KafkaConfig,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer factory
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }

    fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.config.bootstrap_servers)
            .set("group.id", &self.config.group_id)
            .set("client.id", &self.config.client_id)
            // Offsets are committed only after the pipeline for a message completes
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.config.auto_offset_reset)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", self.config.session_timeout_ms.to_string());

        apply_security(&mut client_config, &self.config);
        client_config
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let consumer: StreamConsumer = self.client_config().create().map_err(|e| {
            MessagingError::ConfigurationError(format!("Kafka consumer creation failed: {}", e))
        })?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| {
                MessagingError::SubscribeFailed(format!("Kafka subscribe failed: {}", e))
            })?;

        tracing::info!(topic, group_id = %self.config.group_id, "Joined Kafka consumer group");

        Ok(Box::new(KafkaMessageStream {
            consumer,
            seek_timeout: Duration::from_millis(self.config.session_timeout_ms),
        }))
    }
}

/// Kafka message stream
pub struct KafkaMessageStream {
    consumer: StreamConsumer,
    seek_timeout: Duration,
}

#[async_trait]
impl MessageStream for KafkaMessageStream {
    async fn next(&mut self) -> MessagingResult<Option<ReceivedMessage>> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka recv failed: {}", e)))?;

        Ok(Some(ReceivedMessage {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }

    async fn ack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )
        .map_err(|e| MessagingError::CommitFailed(format!("Invalid offset: {}", e)))?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| MessagingError::CommitFailed(format!("Kafka commit failed: {}", e)))
    }

    async fn nack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        // Rewind the partition so the same offset is fetched again
        self.consumer
            .seek(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset),
                self.seek_timeout,
            )
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka seek failed: {}", e)))
    }
}
