//! Stateless helpers the editor calls before saving.
use axum::{routing::post, Json, Router};
use serde_json::Value;
use sitebuilder_core::content::ingest::{ingest, IngestOutcome};
use sitebuilder_core::content::migrate::{migrate, MigrationOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/content/migrate", post(migrate_content))
        .route("/v1/content/validate", post(validate_content))
}

/// Upgrade a document to the current version without storing it.
async fn migrate_content(Json(body): Json<Value>) -> ApiResult<Json<MigrationOutcome>> {
    migrate(&body)
        .map(Json)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Run the full save pipeline without storing; always 200 with a report.
async fn validate_content(Json(body): Json<Value>) -> Json<IngestOutcome> {
    Json(ingest(&body))
}
