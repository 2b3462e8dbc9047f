//! Event publisher for incident lifecycle events

use crate::messaging::error::MessagingResult;
use crate::messaging::events::IncidentReported;
use crate::messaging::traits::MessageProducer;
use crate::models::OutboxEntry;
use std::sync::Arc;
use uuid::Uuid;

/// Emits `IncidentReported` events onto the event channel
#[derive(Clone)]
pub struct EventPublisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl EventPublisher {
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Outbox entry announcing `incident_id`, for writing alongside the record
    pub fn outbox_entry(&self, incident_id: Uuid) -> OutboxEntry {
        let event = IncidentReported::new(incident_id);
        OutboxEntry::new(self.topic.clone(), event.key(), event.encode())
    }

    /// Emit one `IncidentReported` keyed by the incident id
    pub async fn publish_reported(&self, incident_id: Uuid) -> MessagingResult<()> {
        let event = IncidentReported::new(incident_id);

        self.producer
            .publish(&self.topic, &event.key(), event.encode().as_bytes())
            .await
            .inspect_err(|e| {
                tracing::error!(
                    incident_id = %incident_id,
                    topic = %self.topic,
                    error = %e,
                    "Failed to publish IncidentReported"
                );
            })?;

        tracing::debug!(
            incident_id = %incident_id,
            topic = %self.topic,
            "Published IncidentReported"
        );
        Ok(())
    }

    /// Forward a stored outbox entry verbatim
    pub async fn publish_entry(&self, entry: &OutboxEntry) -> MessagingResult<()> {
        self.producer
            .publish(&entry.topic, &entry.key, entry.payload.as_bytes())
            .await
    }
}
