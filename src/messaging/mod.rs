//! Event channel for incident lifecycle events
//!
//! This module provides a unified interface over the durable, partitioned,
//! at-least-once log that carries `IncidentReported` events from intake to
//! the enrichment workers.
//!
//! # Features
//!
//! - **Kafka Backend**: durable event log with consumer groups and manual offset commits
//! - **In-Memory Backend**: same group/ack contract in-process, for tests and local runs
//! - **Keyed Publishing**: events are keyed by incident id for per-incident ordering
//! - **Metrics Integration**: Prometheus metrics for publish and consume
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │   EventPublisher / MessagingService              │
//! ├─────────────────────────────────────────────────┤
//! │  - publish_reported()   - subscribe()            │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │  MessageProducer / MessageConsumer / MessageStream│
//! └─────────────────────────────────────────────────┘
//!           │                        │
//!           ▼                        ▼
//! ┌──────────────────┐    ┌──────────────────┐
//! │  Kafka Backend   │    │ In-Memory Backend│
//! └──────────────────┘    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use civic_pulse::messaging::{
//!     EventPublisher, MessagingBackend, MessagingConfig, MessagingService,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MessagingConfig {
//!         backend: MessagingBackend::InMemory,
//!         ..Default::default()
//!     };
//!     let topic = config.topic.clone();
//!     let messaging = Arc::new(MessagingService::new(config)?);
//!
//!     let publisher = EventPublisher::new(messaging, topic);
//!     publisher.publish_reported(uuid::Uuid::new_v4()).await?;
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod kafka;
mod memory;
mod metrics;
mod publisher;
mod service;
mod traits;

pub use config::{KafkaConfig, MessagingBackend, MessagingConfig};
pub use error::{MessagingError, MessagingResult};
pub use events::{IncidentReported, ReceivedMessage};
pub use kafka::{KafkaConsumer, KafkaProducer};
pub use memory::{InMemoryChannel, DEFAULT_HISTORY_LIMIT};
pub use metrics::{init_messaging_metrics, MESSAGING_METRICS};
pub use publisher::EventPublisher;
pub use service::MessagingService;
pub use traits::{MessageConsumer, MessageProducer, MessageStream};
