use crate::error::Result;
use crate::models::{Incident, OutboxEntry};
use crate::state::IncidentStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory incident store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<Uuid, Incident>>,
    outbox: Arc<Mutex<BTreeMap<Uuid, OutboxEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        Ok(self.incidents.get(id).map(|entry| entry.clone()))
    }

    async fn upsert_incident(&self, incident: &Incident) -> Result<()> {
        self.incidents.insert(incident.id, incident.clone());
        tracing::debug!(incident_id = %incident.id, "Incident upserted");
        Ok(())
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let mut incidents: Vec<Incident> = self
            .incidents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(incidents)
    }

    async fn insert_with_outbox(&self, incident: &Incident, entry: &OutboxEntry) -> Result<()> {
        // Holding the outbox lock across both inserts keeps a relay from
        // observing the entry before its incident exists.
        let mut outbox = self.outbox.lock();
        self.incidents.insert(incident.id, incident.clone());
        outbox.insert(entry.id, entry.clone());

        tracing::debug!(
            incident_id = %incident.id,
            outbox_id = %entry.id,
            "Incident saved with outbox entry"
        );
        Ok(())
    }

    async fn pending_outbox(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        Ok(self.outbox.lock().values().take(limit).cloned().collect())
    }

    async fn remove_outbox(&self, id: &Uuid) -> Result<()> {
        self.outbox.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Classification, IncidentStatus, Priority};

    #[tokio::test]
    async fn test_upsert_and_get_incident() {
        let store = InMemoryStore::new();
        let incident = Incident::new("Pothole on Main St".to_string(), None);

        store.upsert_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&incident.id).await.unwrap();
        assert_eq!(retrieved, Some(incident));
    }

    #[tokio::test]
    async fn test_get_missing_incident() {
        let store = InMemoryStore::new();
        let retrieved = store.get_incident(&Uuid::new_v4()).await.unwrap();
        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_record() {
        let store = InMemoryStore::new();
        let mut incident = Incident::new("Graffiti on bridge".to_string(), None);
        store.upsert_incident(&incident).await.unwrap();

        incident.mark_analyzed(Classification::new(Category::Other, Priority::Low));
        store.upsert_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(retrieved.status, IncidentStatus::Analyzed);
        assert_eq!(store.list_incidents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryStore::new();

        let mut older = Incident::new("older".to_string(), None);
        older.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let newer = Incident::new("newer".to_string(), None);

        store.upsert_incident(&older).await.unwrap();
        store.upsert_incident(&newer).await.unwrap();

        let listed = store.list_incidents().await.unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn test_outbox_roundtrip() {
        let store = InMemoryStore::new();
        let incident = Incident::new("Fallen tree".to_string(), None);
        let entry = OutboxEntry::new(
            "incident-reported",
            incident.id.to_string(),
            incident.id.to_string(),
        );

        store.insert_with_outbox(&incident, &entry).await.unwrap();

        assert!(store.get_incident(&incident.id).await.unwrap().is_some());
        let pending = store.pending_outbox(10).await.unwrap();
        assert_eq!(pending, vec![entry.clone()]);

        store.remove_outbox(&entry.id).await.unwrap();
        assert!(store.pending_outbox(10).await.unwrap().is_empty());
    }
}
