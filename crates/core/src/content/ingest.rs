//! Write path for untrusted editor submissions.
//!
//! `validate_raw` -> `migrate` -> `sanitize_page_content` ->
//! `validate_page_content`. Only a successful report carries content.
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::migrate::{migrate, ContentVersion};
use super::model::PageContent;
use super::validate::{validate_page_content, validate_raw, ValidationReport};
use crate::sanitize::sanitize_page_content;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    #[serde(flatten)]
    pub report: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ContentVersion>,
    /// The submission had to be rewritten to reach the current shape.
    pub migrated: bool,
    /// Present only when `report.success` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<PageContent>,
}

impl IngestOutcome {
    fn rejected(report: ValidationReport, from: Option<ContentVersion>) -> Self {
        Self {
            report,
            from,
            migrated: false,
            content: None,
        }
    }
}

/// Normalize, sanitize and validate a submitted document.
pub fn ingest(value: &Value) -> IngestOutcome {
    let mut report = validate_raw(value);
    if !report.success {
        return IngestOutcome::rejected(report, None);
    }

    let outcome = match migrate(value) {
        Ok(outcome) => outcome,
        Err(err) => {
            report.error_message(err.to_string());
            return IngestOutcome::rejected(report, None);
        }
    };
    report.extend_warnings(outcome.warnings);

    let mut prepared = prepare(outcome.content, report, Some(outcome.from));
    prepared.migrated = outcome.changed;
    prepared
}

/// Sanitize and validate content that is already typed, e.g. after editor
/// commands were applied to a stored page.
pub fn prepare(
    content: PageContent,
    mut report: ValidationReport,
    from: Option<ContentVersion>,
) -> IngestOutcome {
    let clean = sanitize_page_content(&content);
    if clean != content {
        debug!("sanitizer modified submitted content");
    }
    report.merge(validate_page_content(&clean));
    if !report.success {
        return IngestOutcome::rejected(report, from);
    }
    IngestOutcome {
        report,
        from,
        migrated: false,
        content: Some(clean),
    }
}
