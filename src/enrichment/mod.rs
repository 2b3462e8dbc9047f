/// Asynchronous incident enrichment
///
/// This module turns submitted incidents into analyzed ones:
/// - `EnrichmentConsumer` runs decode → load → classify → parse → write-back
///   for one `IncidentReported` event
/// - Transient classifier failures are retried with capped exponential backoff
/// - Exhausted events are forwarded to the dead letter topic
/// - `spawn_workers` runs one consumer-group member per worker

pub mod consumer;
pub mod metrics;
pub mod models;
pub mod worker;

pub use consumer::EnrichmentConsumer;
pub use metrics::{init_enrichment_metrics, ENRICHMENT_METRICS};
pub use models::{EnrichmentConfig, EnrichmentError, EventOutcome};
pub use worker::{run_worker, spawn_workers};
