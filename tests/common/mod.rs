//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use civic_pulse::classifier::{ClassificationResult, Classifier};
use civic_pulse::enrichment::{EnrichmentConfig, EnrichmentConsumer};
use civic_pulse::error::{AppError, Result};
use civic_pulse::messaging::{EventPublisher, InMemoryChannel};
use civic_pulse::models::{Incident, OutboxEntry};
use civic_pulse::state::{IncidentStore, InMemoryStore};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const TOPIC: &str = "incident-reported";
pub const DLQ_TOPIC: &str = "incident-reported.dlq";

/// Test double replaying scripted classifier results.
///
/// Once a single response is left it is returned for every further call.
pub struct ScriptedClassifier {
    responses: Mutex<VecDeque<ClassificationResult<String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new(responses: Vec<ClassificationResult<String>>) -> Arc<Self> {
        assert!(!responses.is_empty(), "scripted classifier needs a response");
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always(raw: &str) -> Arc<Self> {
        Self::new(vec![Ok(raw.to_string())])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, text: &str) -> ClassificationResult<String> {
        self.calls.lock().push(text.to_string());
        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        }
    }
}

/// Store whose incident reads or writes can be switched to fail
#[derive(Default)]
pub struct FailingStore {
    pub inner: InMemoryStore,
    pub fail_get: AtomicBool,
    pub fail_upsert: AtomicBool,
}

impl FailingStore {
    pub fn failing_get() -> Arc<Self> {
        let store = Self::default();
        store.fail_get.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn failing_upsert() -> Arc<Self> {
        let store = Self::default();
        store.fail_upsert.store(true, Ordering::SeqCst);
        Arc::new(store)
    }
}

#[async_trait]
impl IncidentStore for FailingStore {
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(AppError::Database("read failed".to_string()));
        }
        self.inner.get_incident(id).await
    }

    async fn upsert_incident(&self, incident: &Incident) -> Result<()> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(AppError::Database("write failed".to_string()));
        }
        self.inner.upsert_incident(incident).await
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        self.inner.list_incidents().await
    }

    async fn insert_with_outbox(&self, incident: &Incident, entry: &OutboxEntry) -> Result<()> {
        self.inner.insert_with_outbox(incident, entry).await
    }

    async fn pending_outbox(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        self.inner.pending_outbox(limit).await
    }

    async fn remove_outbox(&self, id: &Uuid) -> Result<()> {
        self.inner.remove_outbox(id).await
    }
}

/// Retry settings that keep tests fast
pub fn fast_retries(max_retries: u32) -> EnrichmentConfig {
    EnrichmentConfig {
        workers: 2,
        max_retries,
        retry_backoff_ms: 1,
        max_backoff_ms: 4,
    }
}

/// In-process wiring of store, channel and consumer
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub channel: InMemoryChannel,
    pub publisher: EventPublisher,
    pub consumer: Arc<EnrichmentConsumer>,
}

impl Harness {
    pub fn new(classifier: Arc<dyn Classifier>, config: EnrichmentConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let channel = InMemoryChannel::new();
        let publisher = EventPublisher::new(Arc::new(channel.clone()), TOPIC);
        let consumer = Arc::new(
            EnrichmentConsumer::new(store.clone(), classifier, config)
                .with_dead_letter(Arc::new(channel.clone()), DLQ_TOPIC),
        );

        Self {
            store,
            channel,
            publisher,
            consumer,
        }
    }
}
