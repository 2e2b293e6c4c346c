//! Hostname parsing for tenant resolution.
//!
//! A request host is one of:
//! - the platform itself: `{root}` or `{reserved}.{root}`
//! - a tenant subdomain: `{subdomain}.{root}`
//! - a tenant custom domain: anything else, with a leading `www.` ignored
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::model::DomainConfig;

const MAX_HOST_LEN: usize = 253;
const WWW_PREFIX: &str = "www.";

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteError {
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("invalid subdomain '{subdomain}': {reason}")]
    InvalidSubdomain {
        subdomain: String,
        reason: &'static str,
    },
    #[error("subdomain '{0}' is reserved")]
    ReservedSubdomain(String),
    #[error("invalid custom domain '{domain}': {reason}")]
    InvalidCustomDomain {
        domain: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResolution {
    Platform,
    Subdomain(String),
    CustomDomain(String),
    Invalid,
}

impl HostResolution {
    pub fn is_tenant(&self) -> bool {
        matches!(
            self,
            HostResolution::Subdomain(_) | HostResolution::CustomDomain(_)
        )
    }
}

fn is_ip(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}

/// Canonical form of a `Host` header value: lowercase, no port, no
/// trailing dot. `None` if what remains is not a valid hostname or IP.
pub fn normalize_host(raw: &str) -> Option<String> {
    let host = raw.trim().to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    if host.starts_with('[') {
        let end = host.find(']')?;
        let literal = &host[..=end];
        let rest = &host[end + 1..];
        if !(rest.is_empty() || rest.strip_prefix(':').is_some_and(is_port)) {
            return None;
        }
        return is_ip(literal).then(|| literal.to_string());
    }

    let host = match host.rsplit_once(':') {
        Some((name, port)) if is_port(port) && !name.contains(':') => name,
        Some(_) => return None,
        None => host.as_str(),
    };
    let host = host.trim_end_matches('.');

    if host.is_empty() || host.len() > MAX_HOST_LEN {
        return None;
    }
    if is_ip(host) {
        return Some(host.to_string());
    }
    host.split('.')
        .all(|label| LABEL.is_match(label))
        .then(|| host.to_string())
}

fn is_port(s: &str) -> bool {
    !s.is_empty() && s.len() <= 5 && s.chars().all(|c| c.is_ascii_digit())
}

/// Classify a request host against the platform's domain setup.
pub fn resolve_host(raw: &str, config: &DomainConfig) -> HostResolution {
    let Some(host) = normalize_host(raw) else {
        return HostResolution::Invalid;
    };
    if is_ip(&host) || host == config.root_domain {
        return HostResolution::Platform;
    }

    let root_suffix = format!(".{}", config.root_domain);
    if let Some(prefix) = host.strip_suffix(&root_suffix) {
        let label = prefix.strip_prefix(WWW_PREFIX).unwrap_or(prefix);
        if label.contains('.') {
            return HostResolution::Invalid;
        }
        if config.is_reserved(label) {
            return HostResolution::Platform;
        }
        return HostResolution::Subdomain(label.to_string());
    }

    let domain = host.strip_prefix(WWW_PREFIX).unwrap_or(&host);
    if domain.contains('.') {
        HostResolution::CustomDomain(domain.to_string())
    } else {
        HostResolution::Invalid
    }
}

/// Check a subdomain a tenant wants to claim.
pub fn validate_subdomain(subdomain: &str, config: &DomainConfig) -> Result<(), SiteError> {
    let invalid = |reason| SiteError::InvalidSubdomain {
        subdomain: subdomain.to_string(),
        reason,
    };
    if subdomain.len() < 3 {
        return Err(invalid("must be at least 3 characters"));
    }
    if subdomain.len() > 63 {
        return Err(invalid("must be at most 63 characters"));
    }
    if !LABEL.is_match(subdomain) {
        return Err(invalid(
            "only lowercase letters, digits and inner hyphens are allowed",
        ));
    }
    if config.is_reserved(subdomain) {
        return Err(SiteError::ReservedSubdomain(subdomain.to_string()));
    }
    Ok(())
}

/// Check a custom domain and return its normalized form.
pub fn validate_custom_domain(domain: &str, config: &DomainConfig) -> Result<String, SiteError> {
    let invalid = |reason| SiteError::InvalidCustomDomain {
        domain: domain.to_string(),
        reason,
    };
    let normalized = normalize_host(domain).ok_or_else(|| invalid("not a valid hostname"))?;
    if is_ip(&normalized) {
        return Err(invalid("IP addresses are not allowed"));
    }
    let Some((_, tld)) = normalized.rsplit_once('.') else {
        return Err(invalid("must have at least two labels"));
    };
    if !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("top-level domain must be alphabetic"));
    }
    if normalized == config.root_domain || normalized.ends_with(&format!(".{}", config.root_domain)) {
        return Err(invalid("must not be under the platform domain"));
    }
    Ok(normalized
        .strip_prefix(WWW_PREFIX)
        .map(str::to_string)
        .unwrap_or(normalized))
}
