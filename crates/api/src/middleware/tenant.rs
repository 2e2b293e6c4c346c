use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use sitebuilder_core::site::{resolve_site, Site, SiteLookup};

use crate::error::ApiError;
use crate::state::AppState;

const FORWARDED_HOST: &str = "x-forwarded-host";

/// The tenant site addressed by the request host.
#[derive(Debug, Clone)]
pub struct Tenant(pub Site);

/// Host the client asked for. A proxy's `X-Forwarded-Host` wins over `Host`.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    [FORWARDED_HOST, header::HOST.as_str()]
        .into_iter()
        .filter_map(|name| headers.get(name)?.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let host = request_host(&parts.headers)
            .or_else(|| parts.uri.host().map(str::to_string))
            .ok_or_else(|| ApiError::BadRequest("request has no host".to_string()))?;

        match resolve_site(state.store(), &host, state.domains()).await? {
            SiteLookup::Found(site) => Ok(Tenant(site)),
            SiteLookup::NotFound(_) => Err(ApiError::NotFound(format!("no site is published at {host}"))),
            SiteLookup::Platform => Err(ApiError::NotFound(format!(
                "{host} serves the platform, not a site"
            ))),
            SiteLookup::Invalid => Err(ApiError::BadRequest(format!("invalid host '{host}'"))),
        }
    }
}
