use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message waiting to be relayed to the event channel.
///
/// Written in the same atomic operation as the record it announces, so a
/// crash between persisting the record and publishing cannot lose the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Time-ordered identifier; stores iterate entries in creation order
    pub id: Uuid,

    /// Destination topic
    pub topic: String,

    /// Partition key
    pub key: String,

    /// Message value
    pub payload: String,

    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    pub fn new(
        topic: impl Into<String>,
        key: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            topic: topic.into(),
            key: key.into(),
            payload: payload.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_time_ordered() {
        let first = OutboxEntry::new("incident-reported", "a", "a");
        let second = OutboxEntry::new("incident-reported", "b", "b");

        assert!(first.id < second.id);
        assert!(first.id.as_bytes() < second.id.as_bytes());
    }
}
