//! Transactional outbox relay
//!
//! Incidents are written together with an outbox row in one atomic store
//! operation. The relay forwards pending rows to the event channel and
//! removes each row only after its publish succeeded, so an event is never
//! lost and may at worst be published twice.

pub mod relay;

pub use relay::{OutboxRelay, OUTBOX_METRICS};

use serde::{Deserialize, Serialize};

/// Outbox relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxConfig {
    /// Delay between relay ticks (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum rows forwarded per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_batch_size() -> usize {
    100
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
        }
    }
}
