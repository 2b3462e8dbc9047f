use crate::error::Result;
use crate::messaging::EventPublisher;
use crate::outbox::OutboxConfig;
use crate::state::IncidentStore;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct OutboxMetrics {
    /// Outbox rows processed, by result
    pub rows_relayed: IntCounterVec,
}

lazy_static! {
    pub static ref OUTBOX_METRICS: OutboxMetrics = OutboxMetrics {
        rows_relayed: register_int_counter_vec!(
            "outbox_rows_relayed_total",
            "Total number of outbox rows forwarded to the event channel",
            &["result"]
        )
        .unwrap(),
    };
}

/// Forwards pending outbox rows to the event channel
pub struct OutboxRelay {
    store: Arc<dyn IncidentStore>,
    publisher: EventPublisher,
    config: OutboxConfig,
    metrics_enabled: bool,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn IncidentStore>,
        publisher: EventPublisher,
        config: OutboxConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
            metrics_enabled: true,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    fn record(&self, result: &str) {
        if self.metrics_enabled {
            OUTBOX_METRICS.rows_relayed.with_label_values(&[result]).inc();
        }
    }

    /// Relay one batch in creation order.
    ///
    /// Stops at the first publish failure so later rows never overtake an
    /// earlier one. Returns the number of rows relayed.
    pub async fn run_once(&self) -> Result<usize> {
        let pending = self.store.pending_outbox(self.config.batch_size).await?;
        let mut relayed = 0;

        for entry in pending {
            if let Err(e) = self.publisher.publish_entry(&entry).await {
                warn!(
                    outbox_id = %entry.id,
                    topic = %entry.topic,
                    key = %entry.key,
                    error = %e,
                    "Outbox publish failed; row stays pending"
                );
                self.record("failed");
                break;
            }

            self.store.remove_outbox(&entry.id).await?;
            self.record("published");
            debug!(
                outbox_id = %entry.id,
                topic = %entry.topic,
                key = %entry.key,
                "Outbox row relayed"
            );
            relayed += 1;
        }

        Ok(relayed)
    }

    /// Poll until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            topic = %self.publisher.topic(),
            poll_interval_ms = self.config.poll_interval_ms,
            "Outbox relay started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, code = e.error_code(), "Outbox relay tick failed");
                    }
                }
            }
        }

        info!("Outbox relay stopped");
    }
}
