//! Persistence seam for sites and page documents.
//!
//! Page content is stored as an opaque JSON value and replaced whole on
//! every write; shape handling lives in `sitebuilder_core::content`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sitebuilder_core::site::{
    validate_custom_domain, validate_subdomain, DomainConfig, Site, SiteDirectory, SiteError,
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    InvalidSite(#[from] SiteError),
}

/// A stored page row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub site_id: Uuid,
    pub slug: String,
    pub content: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Postgres(_) => "postgres",
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Memory(_) => Ok(()),
            Store::Postgres(pg) => pg.ping().await,
        }
    }

    /// Store a new site. The subdomain and custom domain are validated and
    /// stored in the normalized form host lookups use.
    pub async fn insert_site(&self, mut site: Site, domains: &DomainConfig) -> Result<Site, StoreError> {
        site.subdomain = site.subdomain.trim().to_ascii_lowercase();
        validate_subdomain(&site.subdomain, domains)?;
        site.custom_domain = site
            .custom_domain
            .as_deref()
            .map(|domain| validate_custom_domain(domain, domains))
            .transpose()?;

        match self {
            Store::Memory(mem) => mem.insert_site(site).await,
            Store::Postgres(pg) => pg.insert_site(site).await,
        }
    }

    pub async fn get_page(&self, site_id: Uuid, slug: &str) -> Result<Option<PageRecord>, StoreError> {
        match self {
            Store::Memory(mem) => Ok(mem.get_page(site_id, slug).await),
            Store::Postgres(pg) => pg.get_page(site_id, slug).await,
        }
    }

    /// Replace the page's document, creating the page if needed. Returns
    /// the document that was replaced.
    pub async fn put_page(
        &self,
        site_id: Uuid,
        slug: &str,
        content: Value,
    ) -> Result<Option<Value>, StoreError> {
        match self {
            Store::Memory(mem) => Ok(mem.put_page(site_id, slug, content).await),
            Store::Postgres(pg) => pg.put_page(site_id, slug, content).await,
        }
    }
}

impl SiteDirectory for Store {
    type Error = StoreError;

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Site>, StoreError> {
        match self {
            Store::Memory(mem) => Ok(mem.find_by_subdomain(subdomain).await),
            Store::Postgres(pg) => pg.find_by_subdomain(subdomain).await,
        }
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        match self {
            Store::Memory(mem) => Ok(mem.find_by_custom_domain(domain).await),
            Store::Postgres(pg) => pg.find_by_custom_domain(domain).await,
        }
    }
}
