use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitebuilder_core::content::editor::{apply_all, EditorCommand};
use sitebuilder_core::content::ingest::{ingest, prepare, IngestOutcome};
use sitebuilder_core::content::migrate::ContentVersion;
use sitebuilder_core::content::serialize::{from_storage, to_storage};
use sitebuilder_core::content::validate::ValidationReport;
use sitebuilder_core::content::PageContent;
use sitebuilder_core::events::{PageSavedEvent, SiteEvent};
use sitebuilder_core::sanitize::sanitize_page_content;
use sitebuilder_core::site::Site;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::tenant::Tenant;
use crate::state::AppState;

const MAX_SLUG_LEN: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pages/{slug}", get(get_page).put(put_page))
        .route("/v1/pages/{slug}/edit", post(edit_page))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageResponse {
    site_id: Uuid,
    slug: String,
    content: PageContent,
    from: ContentVersion,
    /// Stored document is older than `content` and will be upgraded on next save.
    migrated: bool,
    warnings: Vec<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    commands: Vec<EditorCommand>,
}

fn check_slug(slug: &str) -> ApiResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid page slug '{slug}'")))
    }
}

async fn get_page(
    State(state): State<AppState>,
    Tenant(site): Tenant,
    Path(slug): Path<String>,
) -> ApiResult<Json<PageResponse>> {
    check_slug(&slug)?;
    let record = state
        .store()
        .get_page(site.id, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {slug}")))?;

    let loaded = from_storage(&record.content)?;
    Ok(Json(PageResponse {
        site_id: site.id,
        slug,
        content: sanitize_page_content(&loaded.content),
        from: loaded.from,
        migrated: loaded.migrated,
        warnings: loaded.warnings,
        updated_at: record.updated_at,
    }))
}

/// Replace a page's document with an untrusted submission.
async fn put_page(
    State(state): State<AppState>,
    Tenant(site): Tenant,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<IngestOutcome>> {
    check_slug(&slug)?;
    save(&state, &site, &slug, ingest(&body)).await
}

/// Apply editor commands to the stored page and save the result.
async fn edit_page(
    State(state): State<AppState>,
    Tenant(site): Tenant,
    Path(slug): Path<String>,
    Json(request): Json<EditRequest>,
) -> ApiResult<Json<IngestOutcome>> {
    check_slug(&slug)?;
    let record = state
        .store()
        .get_page(site.id, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {slug}")))?;

    let loaded = from_storage(&record.content)?;
    let edited = apply_all(&loaded.content, &request.commands)?;

    let mut report = ValidationReport::new();
    report.extend_warnings(loaded.warnings);
    let mut outcome = prepare(edited, report, Some(loaded.from));
    outcome.migrated = loaded.migrated;
    save(&state, &site, &slug, outcome).await
}

async fn save(
    state: &AppState,
    site: &Site,
    slug: &str,
    outcome: IngestOutcome,
) -> ApiResult<Json<IngestOutcome>> {
    let Some(content) = outcome.content.as_ref() else {
        tracing::debug!(site = %site.id, slug, errors = outcome.report.errors.len(), "page rejected");
        return Err(ApiError::Rejected(outcome.report));
    };

    let previous = state
        .store()
        .put_page(site.id, slug, to_storage(content)?)
        .await?;
    let previous_version = previous
        .as_ref()
        .and_then(|doc| doc.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string);

    tracing::info!(
        site = %site.id,
        slug,
        sections = content.sections.len(),
        migrated = outcome.migrated,
        "page saved"
    );
    state.event_bus().publish(SiteEvent::PageSaved(PageSavedEvent {
        site_id: site.id,
        slug: slug.to_string(),
        previous_version,
        migrated: outcome.migrated,
        section_count: content.sections.len(),
        timestamp: Utc::now(),
    }));

    Ok(Json(outcome))
}
