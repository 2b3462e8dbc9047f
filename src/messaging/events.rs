//! Event types carried on the event channel

use crate::messaging::error::{MessagingError, MessagingResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Announces that an incident was created.
///
/// Carries only the identifier: consumers re-read current state from the
/// store instead of trusting a payload that may be stale by delivery time.
/// On the wire the value is the id's canonical string, with no envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentReported {
    pub incident_id: Uuid,
}

impl IncidentReported {
    pub fn new(incident_id: Uuid) -> Self {
        Self { incident_id }
    }

    /// Partition key; keeps all events for one incident on one partition
    pub fn key(&self) -> String {
        self.incident_id.to_string()
    }

    /// Wire value
    pub fn encode(&self) -> String {
        self.incident_id.to_string()
    }

    /// Decode a wire value
    pub fn decode(payload: &[u8]) -> MessagingResult<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| MessagingError::InvalidMessage(format!("payload is not UTF-8: {}", e)))?;

        let incident_id = Uuid::parse_str(text.trim())
            .map_err(|e| {
                MessagingError::InvalidMessage(format!("invalid incident id {:?}: {}", text, e))
            })?;

        Ok(Self { incident_id })
    }
}

/// A message pulled from the channel, held until acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl ReceivedMessage {
    /// Payload as text, lossily decoded, for logging
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
