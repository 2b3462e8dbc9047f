//! Prometheus metrics for the enrichment pipeline

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

pub struct EnrichmentMetrics {
    /// Events handled, by outcome
    pub events_handled: CounterVec,

    /// Classification retries, by error kind
    pub classification_retries: CounterVec,

    /// Duration of successful classifier calls
    pub classification_latency: Histogram,
}

lazy_static! {
    pub static ref ENRICHMENT_METRICS: EnrichmentMetrics = EnrichmentMetrics {
        events_handled: register_counter_vec!(
            "enrichment_events_handled_total",
            "Total number of IncidentReported events handled",
            &["outcome"]
        )
        .unwrap(),

        classification_retries: register_counter_vec!(
            "enrichment_classification_retries_total",
            "Total number of classification retries",
            &["reason"]
        )
        .unwrap(),

        classification_latency: register_histogram!(
            "enrichment_classification_latency_seconds",
            "Classifier call latency in seconds"
        )
        .unwrap(),
    };
}

/// Initialize enrichment metrics
pub fn init_enrichment_metrics() {
    lazy_static::initialize(&ENRICHMENT_METRICS);
}
