use civic_pulse::{
    config::{StateBackend, StateConfig},
    messaging::{EventPublisher, InMemoryChannel},
    models::{Category, Classification, Incident, OutboxEntry, Priority},
    outbox::{OutboxConfig, OutboxRelay},
    state::{create_store, IncidentStore, InMemoryStore, SledStore},
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test suite that runs against any IncidentStore implementation
async fn test_store_operations<S: IncidentStore + Send + Sync + 'static>(store: Arc<S>) {
    // Insert and retrieve
    let incident = Incident::new(
        "Pothole on Main St".to_string(),
        Some("uploads/p.jpg".to_string()),
    );
    let id = incident.id;
    store.upsert_incident(&incident).await.unwrap();

    let retrieved = store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(retrieved, incident);

    // Full-field replacement
    let mut analyzed = retrieved.clone();
    analyzed.mark_analyzed(Classification::new(Category::Infrastructure, Priority::High));
    store.upsert_incident(&analyzed).await.unwrap();
    store.upsert_incident(&analyzed).await.unwrap();

    let updated = store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(updated, analyzed);
    assert_eq!(store.list_incidents().await.unwrap().len(), 1);

    // Missing record
    assert!(store.get_incident(&uuid::Uuid::new_v4()).await.unwrap().is_none());
}

async fn test_outbox_operations<S: IncidentStore + Send + Sync + 'static>(store: Arc<S>) {
    let mut entries = Vec::new();
    for i in 0..3 {
        let incident = Incident::new(format!("incident {}", i), None);
        let entry = OutboxEntry::new(
            "incident-reported",
            incident.id.to_string(),
            incident.id.to_string(),
        );
        store.insert_with_outbox(&incident, &entry).await.unwrap();
        assert!(store.get_incident(&incident.id).await.unwrap().is_some());
        entries.push(entry);
    }

    let pending = store.pending_outbox(10).await.unwrap();
    assert_eq!(pending, entries);

    store.remove_outbox(&entries[0].id).await.unwrap();
    let pending = store.pending_outbox(1).await.unwrap();
    assert_eq!(pending, vec![entries[1].clone()]);

    // Removing an already-removed row is a no-op
    store.remove_outbox(&entries[0].id).await.unwrap();
}

async fn test_list_order<S: IncidentStore + Send + Sync + 'static>(store: Arc<S>) {
    let mut ids = Vec::new();
    for i in 0..3 {
        let incident = Incident::new(format!("report {}", i), None);
        store.upsert_incident(&incident).await.unwrap();
        ids.push(incident.id);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    ids.reverse();

    let listed: Vec<_> = store.list_incidents().await.unwrap().into_iter().map(|i| i.id).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(Arc::new(InMemoryStore::new())).await;
    test_outbox_operations(Arc::new(InMemoryStore::new())).await;
    test_list_order(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_sled_store() {
    let temp_dir = TempDir::new().unwrap();
    test_store_operations(Arc::new(SledStore::new(temp_dir.path().join("ops")).unwrap())).await;
    test_outbox_operations(Arc::new(SledStore::new(temp_dir.path().join("outbox")).unwrap())).await;
    test_list_order(Arc::new(SledStore::new(temp_dir.path().join("order")).unwrap())).await;
}

/// Rows written before a restart are relayed after it
#[tokio::test]
async fn test_outbox_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = StateConfig {
        backend: StateBackend::Sled,
        path: Some(temp_dir.path().to_path_buf()),
    };
    let channel = InMemoryChannel::new();
    let publisher = EventPublisher::new(Arc::new(channel.clone()), "incident-reported");

    let incident = Incident::new("Water main break".to_string(), None);
    {
        let store = create_store(&config).unwrap();
        store
            .insert_with_outbox(&incident, &publisher.outbox_entry(incident.id))
            .await
            .unwrap();
    }

    let store = create_store(&config).unwrap();
    assert_eq!(store.get_incident(&incident.id).await.unwrap(), Some(incident.clone()));

    let relay = OutboxRelay::new(store.clone(), publisher, OutboxConfig::default());
    assert_eq!(relay.run_once().await.unwrap(), 1);
    assert!(store.pending_outbox(10).await.unwrap().is_empty());

    let published = channel.published("incident-reported");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].payload_text(), incident.id.to_string());
}

#[test]
fn test_sled_backend_requires_path() {
    let config = StateConfig {
        backend: StateBackend::Sled,
        path: None,
    };
    assert!(create_store(&config).is_err());
}
