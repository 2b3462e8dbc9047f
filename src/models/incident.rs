use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A citizen-submitted incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: Uuid,

    /// Creation timestamp, used for ordering only
    pub created_at: DateTime<Utc>,

    /// Free-text description supplied by the reporter
    pub description: String,

    /// Reference to the stored photo, if one was uploaded
    pub image_url: Option<String>,

    /// Enrichment state
    pub status: IncidentStatus,

    /// Category and priority, present once the incident has been analyzed
    pub classification: Option<Classification>,
}

impl Incident {
    /// Create a new incident in the `Submitted` state
    pub fn new(description: String, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            description,
            image_url,
            status: IncidentStatus::Submitted,
            classification: None,
        }
    }

    /// Record the classifier's verdict and move to `Analyzed`.
    ///
    /// Replaces any earlier verdict wholesale, so applying the same
    /// classification twice leaves the incident unchanged.
    pub fn mark_analyzed(&mut self, classification: Classification) {
        self.classification = Some(classification);
        self.status = IncidentStatus::Analyzed;
    }

    /// Category, or `Unknown` while not yet analyzed
    pub fn category(&self) -> Category {
        self.classification
            .map(|c| c.category)
            .unwrap_or(Category::Unknown)
    }

    /// Priority, or `Unknown` while not yet analyzed
    pub fn priority(&self) -> Priority {
        self.classification
            .map(|c| c.priority)
            .unwrap_or(Priority::Unknown)
    }

    pub fn is_analyzed(&self) -> bool {
        self.status == IncidentStatus::Analyzed
    }
}

/// Input accepted from the ingestion surface
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewIncident {
    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    #[validate(length(min = 1, max = 2048))]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Submitted,
    Analyzed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Category {
    Infrastructure,
    Safety,
    Sanitation,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
    Unknown,
}

/// Category and priority derived by the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub priority: Priority,
}

impl Classification {
    pub fn new(category: Category, priority: Priority) -> Self {
        Self { category, priority }
    }

    /// Both fields fell back to `Unknown`
    pub fn is_unknown(&self) -> bool {
        self.category == Category::Unknown && self.priority == Priority::Unknown
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::new(Category::Unknown, Priority::Unknown)
    }
}
