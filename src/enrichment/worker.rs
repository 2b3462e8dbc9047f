//! Enrichment worker loop
//!
//! Each worker owns one group-member stream. A message is handled to
//! completion and then acknowledged; a crash before the ack leaves the
//! message to be redelivered.

use crate::enrichment::consumer::EnrichmentConsumer;
use crate::messaging::{MessageConsumer, MessageStream, MessagingResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const CONSUME_ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// Run one worker until shutdown is signalled or the stream ends.
///
/// Returns the number of messages handled.
pub async fn run_worker(
    worker_id: usize,
    consumer: Arc<EnrichmentConsumer>,
    mut stream: Box<dyn MessageStream>,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    info!(worker_id, "Enrichment worker started");
    let mut handled = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            next = stream.next() => next,
        };

        match next {
            Ok(Some(message)) => {
                debug!(
                    worker_id,
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Received event"
                );

                let outcome = consumer.handle(&message.payload).await;
                handled += 1;

                if let Err(e) = stream.ack(&message).await {
                    warn!(
                        worker_id,
                        offset = message.offset,
                        outcome = outcome.label(),
                        error = %e,
                        "Failed to acknowledge event; it may be redelivered"
                    );
                }
            }
            Ok(None) => {
                info!(worker_id, "Event stream closed");
                break;
            }
            Err(e) => {
                error!(worker_id, error = %e, "Failed to receive event");
                tokio::time::sleep(CONSUME_ERROR_BACKOFF).await;
            }
        }
    }

    info!(worker_id, handled, "Enrichment worker stopped");
    handled
}

/// Subscribe `count` group members to `topic` and run a worker on each
pub async fn spawn_workers(
    consumer: Arc<EnrichmentConsumer>,
    messaging: Arc<dyn MessageConsumer>,
    topic: &str,
    count: usize,
    shutdown: watch::Receiver<bool>,
) -> MessagingResult<Vec<JoinHandle<usize>>> {
    let mut handles = Vec::with_capacity(count);

    for worker_id in 0..count.max(1) {
        let stream = messaging.subscribe(topic).await?;
        handles.push(tokio::spawn(run_worker(
            worker_id,
            consumer.clone(),
            stream,
            shutdown.clone(),
        )));
    }

    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, ClassificationResult};
    use crate::enrichment::EnrichmentConfig;
    use crate::messaging::{InMemoryChannel, MessageProducer};
    use crate::models::Incident;
    use crate::state::{IncidentStore, InMemoryStore};
    use async_trait::async_trait;

    struct FixedClassifier;

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> ClassificationResult<String> {
            Ok(r#"{"category":"SANITATION","priority":"LOW"}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_worker_acks_every_message_and_stops_on_close() {
        let store = Arc::new(InMemoryStore::new());
        let channel = InMemoryChannel::new();
        let consumer = Arc::new(EnrichmentConsumer::new(
            store.clone(),
            Arc::new(FixedClassifier),
            EnrichmentConfig::default(),
        ));

        let incident = Incident::new("Overflowing bin".to_string(), None);
        store.upsert_incident(&incident).await.unwrap();
        channel
            .publish(
                "incident-reported",
                &incident.id.to_string(),
                incident.id.to_string().as_bytes(),
            )
            .await
            .unwrap();
        channel
            .publish("incident-reported", "junk", b"not-a-uuid")
            .await
            .unwrap();

        let (_tx, rx) = watch::channel(false);
        let stream = channel.subscribe("incident-reported").await.unwrap();
        let worker = tokio::spawn(run_worker(0, consumer, stream, rx));

        while channel.acked("incident-reported") < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        channel.close();

        assert_eq!(worker.await.unwrap(), 2);
        assert_eq!(channel.pending("incident-reported"), 0);
        assert!(store.get_incident(&incident.id).await.unwrap().unwrap().is_analyzed());
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_worker() {
        let channel = InMemoryChannel::new();
        let consumer = Arc::new(EnrichmentConsumer::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(FixedClassifier),
            EnrichmentConfig::default(),
        ));

        let (tx, rx) = watch::channel(false);
        let handles = spawn_workers(consumer, Arc::new(channel), "incident-reported", 3, rx)
            .await
            .unwrap();
        assert_eq!(handles.len(), 3);

        tx.send(true).unwrap();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 0);
        }
    }
}
