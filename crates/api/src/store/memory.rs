use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use sitebuilder_core::site::Site;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageRecord, StoreError};

#[derive(Debug, Default)]
struct Inner {
    sites: HashMap<Uuid, Site>,
    pages: HashMap<(Uuid, String), PageRecord>,
}

/// Process-local store for development and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub async fn insert_site(&self, site: Site) -> Result<Site, StoreError> {
        let mut inner = self.inner.write().await;
        let taken = inner.sites.values().any(|existing| {
            existing.id != site.id
                && (existing.subdomain == site.subdomain
                    || (site.custom_domain.is_some() && existing.custom_domain == site.custom_domain))
        });
        if taken {
            return Err(StoreError::Conflict(format!(
                "subdomain or domain of site '{}' already in use",
                site.name
            )));
        }
        inner.sites.insert(site.id, site.clone());
        Ok(site)
    }

    pub async fn find_by_subdomain(&self, subdomain: &str) -> Option<Site> {
        let inner = self.inner.read().await;
        inner.sites.values().find(|s| s.subdomain == subdomain).cloned()
    }

    pub async fn find_by_custom_domain(&self, domain: &str) -> Option<Site> {
        let inner = self.inner.read().await;
        inner
            .sites
            .values()
            .find(|s| s.custom_domain.as_deref() == Some(domain))
            .cloned()
    }

    pub async fn get_page(&self, site_id: Uuid, slug: &str) -> Option<PageRecord> {
        let inner = self.inner.read().await;
        inner.pages.get(&(site_id, slug.to_string())).cloned()
    }

    pub async fn put_page(&self, site_id: Uuid, slug: &str, content: Value) -> Option<Value> {
        let mut inner = self.inner.write().await;
        let record = PageRecord {
            site_id,
            slug: slug.to_string(),
            content,
            updated_at: Utc::now(),
        };
        inner
            .pages
            .insert((site_id, slug.to_string()), record)
            .map(|previous| previous.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_replaces_and_returns_previous() {
        let store = MemoryStore::default();
        let site = store.insert_site(Site::new("Demo", "demo")).await.unwrap();

        assert_eq!(store.put_page(site.id, "home", json!({ "v": 1 })).await, None);
        assert_eq!(
            store.put_page(site.id, "home", json!({ "v": 2 })).await,
            Some(json!({ "v": 1 }))
        );
        let page = store.get_page(site.id, "home").await.unwrap();
        assert_eq!(page.content, json!({ "v": 2 }));
    }

    #[tokio::test]
    async fn subdomain_conflicts_rejected() {
        let store = MemoryStore::default();
        store.insert_site(Site::new("A", "shop")).await.unwrap();
        assert!(matches!(
            store.insert_site(Site::new("B", "shop")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn lookup_by_custom_domain() {
        let store = MemoryStore::default();
        let site = Site::new("Fern", "fern").with_custom_domain("fern.example");
        store.insert_site(site.clone()).await.unwrap();
        assert_eq!(store.find_by_custom_domain("fern.example").await, Some(site));
        assert_eq!(store.find_by_custom_domain("other.example").await, None);
    }
}
