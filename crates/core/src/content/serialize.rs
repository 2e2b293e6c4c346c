//! Conversions between the stored JSONB payload and [`PageContent`].
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::migrate::{migrate, ContentVersion, MigrationError};
use super::model::PageContent;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loaded {
    pub content: PageContent,
    pub from: ContentVersion,
    /// The stored payload differs from `content` and should be written back.
    pub migrated: bool,
    pub warnings: Vec<String>,
}

/// The value written to the `content` column.
pub fn to_storage(content: &PageContent) -> Result<Value, ContentError> {
    Ok(serde_json::to_value(content)?)
}

/// Read a stored payload of any generation as current content.
pub fn from_storage(value: &Value) -> Result<Loaded, ContentError> {
    let outcome = migrate(value)?;
    Ok(Loaded {
        content: outcome.content,
        from: outcome.from,
        migrated: outcome.changed,
        warnings: outcome.warnings,
    })
}

pub fn to_json_string(content: &PageContent, pretty: bool) -> Result<String, ContentError> {
    let text = if pretty {
        serde_json::to_string_pretty(content)?
    } else {
        serde_json::to_string(content)?
    };
    Ok(text)
}

pub fn from_json_str(text: &str) -> Result<Loaded, ContentError> {
    let value: Value = serde_json::from_str(text)?;
    from_storage(&value)
}
