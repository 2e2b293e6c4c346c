//! Tenant sites and hostname resolution.

pub mod host;
pub mod model;
pub mod resolve;

pub use host::{
    normalize_host, resolve_host, validate_custom_domain, validate_subdomain, HostResolution,
    SiteError,
};
pub use model::{DomainConfig, Site};
pub use resolve::{resolve_site, SiteDirectory, SiteLookup};
