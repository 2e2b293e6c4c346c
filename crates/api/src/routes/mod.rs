pub mod content;
pub mod health;
pub mod pages;
pub mod site;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(site::routes())
        .merge(pages::routes())
        .merge(content::routes())
        .with_state(state)
}
