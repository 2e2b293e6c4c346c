use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted after page writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SiteEvent {
    PageSaved(PageSavedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSavedEvent {
    pub site_id: Uuid,
    pub slug: String,
    /// `version` of the document that was replaced, if there was one.
    pub previous_version: Option<String>,
    /// Whether the submission had to be migrated to the current version.
    pub migrated: bool,
    pub section_count: usize,
    pub timestamp: DateTime<Utc>,
}
