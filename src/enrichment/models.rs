use crate::classifier::ClassificationError;
use crate::error::AppError;
use crate::models::Incident;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Enrichment worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Number of consumer-group members to run
    pub workers: usize,

    /// Retries after the first failed classification attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubles on every further retry
    pub retry_backoff_ms: u64,

    /// Upper bound on a single retry delay
    pub max_backoff_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_backoff_ms: 10_000,
        }
    }
}

impl EnrichmentConfig {
    /// Delay before retry number `retry` (1-based), capped at `max_backoff_ms`
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
        let millis = self
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

/// Failure of one event's enrichment pipeline
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// Payload is not a valid incident id
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The referenced incident does not exist (deleted, or a stale event)
    #[error("Incident {0} not found")]
    NotFound(Uuid),

    /// Classifier call failed on every attempt
    #[error("Classification of incident {incident_id} failed after {attempts} attempts: {source}")]
    Classification {
        incident_id: Uuid,
        attempts: u32,
        #[source]
        source: ClassificationError,
    },

    /// Loading or writing back the record failed
    #[error("Persistence error for incident {incident_id}: {source}")]
    Persistence {
        incident_id: Uuid,
        #[source]
        source: AppError,
    },
}

impl EnrichmentError {
    /// Incident the failed event referred to, when it could be decoded
    pub fn incident_id(&self) -> Option<Uuid> {
        match self {
            EnrichmentError::MalformedEvent(_) => None,
            EnrichmentError::NotFound(id) => Some(*id),
            EnrichmentError::Classification { incident_id, .. }
            | EnrichmentError::Persistence { incident_id, .. } => Some(*incident_id),
        }
    }

    /// Whether redelivering the same event may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            EnrichmentError::MalformedEvent(_) | EnrichmentError::NotFound(_) => false,
            EnrichmentError::Classification { source, .. } => source.is_retryable(),
            EnrichmentError::Persistence { source, .. } => source.is_transient(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentError::MalformedEvent(_) => "malformed_event",
            EnrichmentError::NotFound(_) => "not_found",
            EnrichmentError::Classification { .. } => "classification",
            EnrichmentError::Persistence { .. } => "persistence",
        }
    }
}

/// What became of one delivered event.
///
/// Every variant means the event is handled and may be acknowledged.
#[derive(Debug)]
pub enum EventOutcome {
    /// Incident classified and written back as `Analyzed`
    Analyzed(Incident),

    /// Event could not refer to a live incident; nothing to do
    Dropped(EnrichmentError),

    /// Classification exhausted its retries; payload forwarded to the dead letter topic
    DeadLettered(EnrichmentError),

    /// Pipeline failed and the record was left unchanged
    Failed(EnrichmentError),
}

impl EventOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Analyzed(_) => "analyzed",
            EventOutcome::Dropped(_) => "dropped",
            EventOutcome::DeadLettered(_) => "dead_lettered",
            EventOutcome::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&EnrichmentError> {
        match self {
            EventOutcome::Analyzed(_) => None,
            EventOutcome::Dropped(e) | EventOutcome::DeadLettered(e) | EventOutcome::Failed(e) => {
                Some(e)
            }
        }
    }
}
