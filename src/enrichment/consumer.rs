use crate::classifier::{parse_classification, Classifier};
use crate::enrichment::metrics::{EnrichmentMetrics, ENRICHMENT_METRICS};
use crate::enrichment::models::{EnrichmentConfig, EnrichmentError, EventOutcome};
use crate::messaging::{IncidentReported, MessageProducer};
use crate::models::Incident;
use crate::state::IncidentStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

struct DeadLetter {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

/// Turns `IncidentReported` events into analyzed incidents.
///
/// Each stage returns `Result<_, EnrichmentError>`; `handle` matches on the
/// error kind to decide between dropping, dead-lettering and giving up, so
/// no failure escapes to the worker loop. Re-running the pipeline for the
/// same event is safe: the write-back replaces the classification fields
/// wholesale.
pub struct EnrichmentConsumer {
    store: Arc<dyn IncidentStore>,
    classifier: Arc<dyn Classifier>,
    config: EnrichmentConfig,
    dead_letter: Option<DeadLetter>,
    metrics_enabled: bool,
}

impl EnrichmentConsumer {
    pub fn new(
        store: Arc<dyn IncidentStore>,
        classifier: Arc<dyn Classifier>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            config,
            dead_letter: None,
            metrics_enabled: true,
        }
    }

    /// Forward events whose classification exhausted its retries to `topic`
    pub fn with_dead_letter(
        mut self,
        producer: Arc<dyn MessageProducer>,
        topic: impl Into<String>,
    ) -> Self {
        self.dead_letter = Some(DeadLetter {
            producer,
            topic: topic.into(),
        });
        self
    }

    /// Record Prometheus metrics; disabled consumers never register them
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    fn metrics(&self) -> Option<&'static EnrichmentMetrics> {
        self.metrics_enabled.then(|| &*ENRICHMENT_METRICS)
    }

    /// Process one delivered payload to completion
    pub async fn handle(&self, payload: &[u8]) -> EventOutcome {
        let outcome = match self.enrich(payload).await {
            Ok(incident) => {
                info!(
                    incident_id = %incident.id,
                    category = %incident.category(),
                    priority = %incident.priority(),
                    "Incident analyzed"
                );
                EventOutcome::Analyzed(incident)
            }
            Err(err @ EnrichmentError::MalformedEvent(_)) => {
                warn!(
                    payload = %String::from_utf8_lossy(payload),
                    error = %err,
                    "Dropping undecodable event"
                );
                EventOutcome::Dropped(err)
            }
            Err(err @ EnrichmentError::NotFound(_)) => {
                warn!(error = %err, "Dropping event for missing incident");
                EventOutcome::Dropped(err)
            }
            Err(err @ EnrichmentError::Classification { .. }) => {
                error!(
                    error = %err,
                    transient = err.is_transient(),
                    "Classification failed; incident left submitted"
                );
                self.dead_letter(payload, err).await
            }
            Err(err @ EnrichmentError::Persistence { .. }) => {
                error!(
                    error = %err,
                    transient = err.is_transient(),
                    "Persistence failed; incident left unchanged"
                );
                EventOutcome::Failed(err)
            }
        };

        if let Some(metrics) = self.metrics() {
            metrics
                .events_handled
                .with_label_values(&[outcome.label()])
                .inc();
        }

        outcome
    }

    /// Run decode → load → classify → parse → write-back
    pub async fn enrich(&self, payload: &[u8]) -> Result<Incident, EnrichmentError> {
        let incident_id = Self::decode(payload)?;
        let mut incident = self.load(incident_id).await?;

        let raw = self.classify(&incident).await?;
        let classification = parse_classification(&raw);
        if classification.is_unknown() {
            warn!(
                incident_id = %incident_id,
                response = %raw,
                "Classifier response yielded no known fields"
            );
        }

        incident.mark_analyzed(classification);
        self.store
            .upsert_incident(&incident)
            .await
            .map_err(|source| EnrichmentError::Persistence { incident_id, source })?;

        Ok(incident)
    }

    fn decode(payload: &[u8]) -> Result<Uuid, EnrichmentError> {
        IncidentReported::decode(payload)
            .map(|event| event.incident_id)
            .map_err(|e| EnrichmentError::MalformedEvent(e.to_string()))
    }

    async fn load(&self, incident_id: Uuid) -> Result<Incident, EnrichmentError> {
        self.store
            .get_incident(&incident_id)
            .await
            .map_err(|source| EnrichmentError::Persistence { incident_id, source })?
            .ok_or(EnrichmentError::NotFound(incident_id))
    }

    /// Call the classifier, retrying retryable failures with capped exponential backoff
    async fn classify(&self, incident: &Incident) -> Result<String, EnrichmentError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let start = Instant::now();

            match self.classifier.classify(&incident.description).await {
                Ok(raw) => {
                    if let Some(metrics) = self.metrics() {
                        metrics
                            .classification_latency
                            .observe(start.elapsed().as_secs_f64());
                    }
                    debug!(
                        incident_id = %incident.id,
                        attempts,
                        response = %raw,
                        "Classifier response received"
                    );
                    return Ok(raw);
                }
                Err(source) if source.is_retryable() && attempts <= self.config.max_retries => {
                    let delay = self.config.backoff(attempts);
                    warn!(
                        incident_id = %incident.id,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %source,
                        "Retrying classification"
                    );
                    if let Some(metrics) = self.metrics() {
                        metrics
                            .classification_retries
                            .with_label_values(&[source.kind()])
                            .inc();
                    }
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(EnrichmentError::Classification {
                        incident_id: incident.id,
                        attempts,
                        source,
                    });
                }
            }
        }
    }

    async fn dead_letter(&self, payload: &[u8], err: EnrichmentError) -> EventOutcome {
        let Some(ref dead_letter) = self.dead_letter else {
            return EventOutcome::Failed(err);
        };

        let key = err.incident_id().map(|id| id.to_string()).unwrap_or_default();

        match dead_letter.producer.publish(&dead_letter.topic, &key, payload).await {
            Ok(()) => {
                info!(
                    incident_id = %key,
                    topic = %dead_letter.topic,
                    "Event moved to dead letter topic"
                );
                EventOutcome::DeadLettered(err)
            }
            Err(publish_err) => {
                error!(
                    incident_id = %key,
                    topic = %dead_letter.topic,
                    error = %publish_err,
                    "Failed to dead-letter event"
                );
                EventOutcome::Failed(err)
            }
        }
    }
}
