use chrono::{DateTime, Utc};
use serde_json::Value;
use sitebuilder_core::site::Site;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{PageRecord, StoreError};

/// Store backed by the `sites` and `pages` tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SiteRow {
    id: Uuid,
    name: String,
    subdomain: String,
    custom_domain: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Site {
            id: row.id,
            name: row.name,
            subdomain: row.subdomain,
            custom_domain: row.custom_domain,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PageRow {
    site_id: Uuid,
    slug: String,
    content: Value,
    updated_at: DateTime<Utc>,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        PageRecord {
            site_id: row.site_id,
            slug: row.slug,
            content: row.content,
            updated_at: row.updated_at,
        }
    }
}

const SITE_COLUMNS: &str = "id, name, subdomain, custom_domain, created_at, updated_at";

impl PgStore {
    pub async fn connect(url: &str, max: u32, min: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max)
            .min_connections(min)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn insert_site(&self, site: Site) -> Result<Site, StoreError> {
        let result = sqlx::query(
            "INSERT INTO sites (id, name, subdomain, custom_domain, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(site.id)
        .bind(&site.name)
        .bind(&site.subdomain)
        .bind(&site.custom_domain)
        .bind(site.created_at)
        .bind(site.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(site),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict(
                format!("subdomain or domain of site '{}' already in use", site.name),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Site>, StoreError> {
        let row: Option<SiteRow> =
            sqlx::query_as(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE subdomain = $1"))
                .bind(subdomain)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Site::from))
    }

    pub async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        let row: Option<SiteRow> =
            sqlx::query_as(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE custom_domain = $1"))
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Site::from))
    }

    pub async fn get_page(&self, site_id: Uuid, slug: &str) -> Result<Option<PageRecord>, StoreError> {
        let row: Option<PageRow> = sqlx::query_as(
            "SELECT site_id, slug, content, updated_at FROM pages WHERE site_id = $1 AND slug = $2",
        )
        .bind(site_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PageRecord::from))
    }

    pub async fn put_page(
        &self,
        site_id: Uuid,
        slug: &str,
        content: Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<Value> = sqlx::query_scalar(
            "SELECT content FROM pages WHERE site_id = $1 AND slug = $2 FOR UPDATE",
        )
        .bind(site_id)
        .bind(slug)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO pages (site_id, slug, content) VALUES ($1, $2, $3) \
             ON CONFLICT (site_id, slug) \
             DO UPDATE SET content = EXCLUDED.content, updated_at = now()",
        )
        .bind(site_id)
        .bind(slug)
        .bind(content)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous)
    }
}
