//! Main messaging service

use crate::messaging::config::{MessagingBackend, MessagingConfig};
use crate::messaging::error::MessagingResult;
use crate::messaging::events::ReceivedMessage;
use crate::messaging::kafka::{KafkaConsumer, KafkaProducer};
use crate::messaging::memory::InMemoryChannel;
use crate::messaging::metrics::MESSAGING_METRICS;
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Main messaging service providing unified access to the event channel
pub struct MessagingService {
    config: MessagingConfig,
    producer: Arc<dyn MessageProducer>,
    consumer: Arc<dyn MessageConsumer>,
}

impl MessagingService {
    /// Create a new messaging service for the configured backend
    pub fn new(config: MessagingConfig) -> MessagingResult<Self> {
        let (producer, consumer): (Arc<dyn MessageProducer>, Arc<dyn MessageConsumer>) =
            match config.backend {
                MessagingBackend::Kafka => (
                    Arc::new(KafkaProducer::new(config.kafka.clone())?),
                    Arc::new(KafkaConsumer::new(config.kafka.clone())),
                ),
                MessagingBackend::InMemory => {
                    let channel = InMemoryChannel::new();
                    (Arc::new(channel.clone()), Arc::new(channel))
                }
            };

        Ok(Self::with_backend(config, producer, consumer))
    }

    /// Create a messaging service over explicit producer/consumer backends
    pub fn with_backend(
        config: MessagingConfig,
        producer: Arc<dyn MessageProducer>,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        if config.enable_metrics {
            crate::messaging::metrics::init_messaging_metrics();
        }

        tracing::info!(
            backend = ?config.backend,
            topic = %config.topic,
            "Messaging service initialized"
        );

        Self {
            config,
            producer,
            consumer,
        }
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    fn backend_name(&self) -> String {
        format!("{:?}", self.config.backend)
    }
}

#[async_trait]
impl MessageProducer for MessagingService {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        let start = Instant::now();
        let result = self.producer.publish(topic, key, payload).await;

        if self.config.enable_metrics {
            let backend_name = self.backend_name();

            if result.is_ok() {
                MESSAGING_METRICS
                    .messages_published
                    .with_label_values(&[topic, &backend_name])
                    .inc();

                MESSAGING_METRICS
                    .publish_latency
                    .with_label_values(&[topic, &backend_name])
                    .observe(start.elapsed().as_secs_f64());
            } else {
                MESSAGING_METRICS
                    .publish_failures
                    .with_label_values(&[topic, &backend_name])
                    .inc();
            }
        }

        result
    }

    async fn close(&self) -> MessagingResult<()> {
        self.producer.close().await
    }
}

#[async_trait]
impl MessageConsumer for MessagingService {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        let inner = self.consumer.subscribe(topic).await?;

        if !self.config.enable_metrics {
            return Ok(inner);
        }

        Ok(Box::new(MeteredStream {
            inner,
            backend: self.backend_name(),
        }))
    }
}

/// Counts consumed messages on the way through
struct MeteredStream {
    inner: Box<dyn MessageStream>,
    backend: String,
}

#[async_trait]
impl MessageStream for MeteredStream {
    async fn next(&mut self) -> MessagingResult<Option<ReceivedMessage>> {
        let message = self.inner.next().await?;
        if let Some(ref m) = message {
            MESSAGING_METRICS
                .messages_consumed
                .with_label_values(&[&m.topic, &self.backend])
                .inc();
        }
        Ok(message)
    }

    async fn ack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        self.inner.ack(message).await
    }

    async fn nack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        self.inner.nack(message).await
    }
}
