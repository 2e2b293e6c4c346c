//! HTTP service for multi-tenant page content.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// The router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let max_body = state.config().max_body_bytes;
    let origins = state.config().cors_allowed_origins.clone();
    routes::build_router(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer(&origins))
}
