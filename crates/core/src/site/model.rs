use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's website. Reached at `{subdomain}.{root_domain}` and,
/// optionally, at its own custom domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn new(name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            subdomain: subdomain.into(),
            custom_domain: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }
}

/// Subdomains that belong to the platform itself.
pub const DEFAULT_RESERVED_SUBDOMAINS: [&str; 6] = ["www", "app", "api", "admin", "dashboard", "mail"];

/// How hostnames map onto the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    /// Tenants live one label below this, e.g. `greenleaf.example.com`.
    pub root_domain: String,
    pub reserved_subdomains: BTreeSet<String>,
}

impl DomainConfig {
    pub fn new(root_domain: impl Into<String>) -> Self {
        Self {
            root_domain: root_domain.into().trim().trim_end_matches('.').to_ascii_lowercase(),
            reserved_subdomains: DEFAULT_RESERVED_SUBDOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the reserved list.
    pub fn with_reserved<I, S>(mut self, reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved_subdomains = reserved
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved_subdomains.contains(label)
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}
