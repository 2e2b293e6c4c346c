use std::env;
use std::str::FromStr;

use sitebuilder_core::site::DomainConfig;
use sitebuilder_core::site::model::DEFAULT_RESERVED_SUBDOMAINS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL. Pages are kept in memory when unset.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Domain tenants are served under as subdomains.
    pub root_domain: String,
    /// Subdomains that resolve to the platform instead of a tenant.
    pub reserved_subdomains: Vec<String>,
    /// CORS allowed origins; `*` allows any.
    pub cors_allowed_origins: Vec<String>,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var: name, value })
}

fn list_var(name: &str, default: &str) -> Vec<String> {
    var_or(name, default)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "3030")?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", "5")?,
            root_domain: var_or("ROOT_DOMAIN", "localhost"),
            reserved_subdomains: list_var(
                "RESERVED_SUBDOMAINS",
                &DEFAULT_RESERVED_SUBDOMAINS.join(","),
            ),
            cors_allowed_origins: list_var("CORS_ALLOWED_ORIGINS", "*"),
            event_bus_capacity: parse_var("EVENT_BUS_CAPACITY", "1024")?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", "1048576")?,
            log_level: var_or("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn domain_config(&self) -> DomainConfig {
        DomainConfig::new(&self.root_domain).with_reserved(&self.reserved_subdomains)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            database_url: None,
            db_max_connections: 20,
            db_min_connections: 5,
            root_domain: "localhost".to_string(),
            reserved_subdomains: DEFAULT_RESERVED_SUBDOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cors_allowed_origins: vec!["*".to_string()],
            event_bus_capacity: 1024,
            max_body_bytes: 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_config_uses_reserved_list() {
        let config = AppConfig {
            root_domain: "Sites.Test".to_string(),
            reserved_subdomains: vec!["beta".to_string()],
            ..AppConfig::default()
        };
        let domains = config.domain_config();
        assert_eq!(domains.root_domain, "sites.test");
        assert!(domains.is_reserved("beta"));
        assert!(!domains.is_reserved("www"));
    }

    #[test]
    fn addr_joins_host_and_port() {
        assert_eq!(AppConfig::default().addr(), "127.0.0.1:3030");
    }
}
