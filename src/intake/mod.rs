//! Incident intake
//!
//! Validates new reports and stores each one together with the outbox row
//! announcing it. Publishing is left to the outbox relay.

use crate::error::{AppError, Result};
use crate::messaging::EventPublisher;
use crate::models::{Incident, NewIncident};
use crate::state::IncidentStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn IncidentStore>,
    publisher: EventPublisher,
}

impl IntakeService {
    pub fn new(store: Arc<dyn IncidentStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Create a `Submitted` incident and queue its `IncidentReported` event
    pub async fn report(&self, request: NewIncident) -> Result<Incident> {
        let request = NewIncident {
            description: request.description.trim().to_string(),
            image_url: request
                .image_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };
        request.validate()?;

        let incident = Incident::new(request.description, request.image_url);
        let entry = self.publisher.outbox_entry(incident.id);
        self.store.insert_with_outbox(&incident, &entry).await?;

        info!(
            incident_id = %incident.id,
            has_image = incident.image_url.is_some(),
            "Incident reported"
        );
        Ok(incident)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Incident> {
        self.store
            .get_incident(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    /// All incidents, newest first
    pub async fn list(&self) -> Result<Vec<Incident>> {
        self.store.list_incidents().await
    }
}
