use axum::{routing::get, Json, Router};
use sitebuilder_core::site::Site;

use crate::middleware::tenant::Tenant;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/site", get(current_site))
}

/// The site addressed by the request host.
async fn current_site(Tenant(site): Tenant) -> Json<Site> {
    Json(site)
}
