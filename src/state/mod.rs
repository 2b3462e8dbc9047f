pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{Incident, OutboxEntry};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable keyed storage for incidents and their pending outbound events
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Get an incident by ID
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>>;

    /// Insert or fully replace an incident
    async fn upsert_incident(&self, incident: &Incident) -> Result<()>;

    /// All incidents, newest first
    async fn list_incidents(&self) -> Result<Vec<Incident>>;

    /// Persist a new incident and its outbox entry in one atomic write
    async fn insert_with_outbox(&self, incident: &Incident, entry: &OutboxEntry) -> Result<()>;

    /// Up to `limit` pending outbox entries, oldest first
    async fn pending_outbox(&self, limit: usize) -> Result<Vec<OutboxEntry>>;

    /// Drop an outbox entry once it has been published
    async fn remove_outbox(&self, id: &Uuid) -> Result<()>;
}
