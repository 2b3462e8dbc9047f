use crate::error::{AppError, Result};
use crate::models::{Incident, OutboxEntry};
use crate::state::IncidentStore;
use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent incident store using Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents_tree: sled::Tree,
    outbox_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(&path).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let incidents_tree = db.open_tree("incidents").map_err(|e| {
            AppError::Database(format!("Failed to open incidents tree: {}", e))
        })?;

        let outbox_tree = db.open_tree("outbox").map_err(|e| {
            AppError::Database(format!("Failed to open outbox tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            incidents_tree,
            outbox_tree,
        })
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    fn serialize_incident(incident: &Incident) -> Result<Vec<u8>> {
        bincode::serialize(incident).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize incident: {}", e))
        })
    }

    fn deserialize_incident(bytes: &[u8]) -> Result<Incident> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize incident: {}", e))
        })
    }

    fn serialize_entry(entry: &OutboxEntry) -> Result<Vec<u8>> {
        bincode::serialize(entry).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize outbox entry: {}", e))
        })
    }

    fn deserialize_entry(bytes: &[u8]) -> Result<OutboxEntry> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize outbox entry: {}", e))
        })
    }
}

#[async_trait]
impl IncidentStore for SledStore {
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        match self.incidents_tree.get(id.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_incident(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!(
                "Failed to get incident: {}",
                e
            ))),
        }
    }

    async fn upsert_incident(&self, incident: &Incident) -> Result<()> {
        let value = Self::serialize_incident(incident)?;

        self.incidents_tree
            .insert(incident.id.as_bytes(), value)
            .map_err(|e| AppError::Database(format!("Failed to upsert incident: {}", e)))?;

        self.flush().await?;

        tracing::debug!(incident_id = %incident.id, "Incident upserted in Sled");
        Ok(())
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let mut incidents = Vec::new();

        for result in self.incidents_tree.iter() {
            let (_, value) = result.map_err(|e| {
                AppError::Database(format!("Failed to iterate incidents: {}", e))
            })?;
            incidents.push(Self::deserialize_incident(&value)?);
        }

        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(incidents)
    }

    async fn insert_with_outbox(&self, incident: &Incident, entry: &OutboxEntry) -> Result<()> {
        let incident_value = Self::serialize_incident(incident)?;
        let entry_value = Self::serialize_entry(entry)?;

        (&self.incidents_tree, &self.outbox_tree)
            .transaction(|(incidents, outbox)| {
                incidents.insert(&incident.id.as_bytes()[..], &incident_value[..])?;
                outbox.insert(&entry.id.as_bytes()[..], &entry_value[..])?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Storage(err) => AppError::Database(format!(
                    "Failed to write incident with outbox entry: {}",
                    err
                )),
                TransactionError::Abort(()) => {
                    AppError::Database("Outbox transaction aborted".to_string())
                }
            })?;

        self.flush().await?;

        tracing::debug!(
            incident_id = %incident.id,
            outbox_id = %entry.id,
            "Incident saved to Sled with outbox entry"
        );
        Ok(())
    }

    async fn pending_outbox(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        let mut entries = Vec::new();

        // Keys are v7 UUID bytes, so tree order is creation order
        for result in self.outbox_tree.iter().take(limit) {
            let (_, value) = result.map_err(|e| {
                AppError::Database(format!("Failed to iterate outbox: {}", e))
            })?;
            entries.push(Self::deserialize_entry(&value)?);
        }

        Ok(entries)
    }

    async fn remove_outbox(&self, id: &Uuid) -> Result<()> {
        self.outbox_tree
            .remove(id.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to remove outbox entry: {}", e)))?;

        self.flush().await
    }
}
