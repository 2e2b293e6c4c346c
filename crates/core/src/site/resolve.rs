use std::future::Future;

use tracing::debug;

use super::host::{resolve_host, HostResolution};
use super::model::{DomainConfig, Site};

/// Lookup of sites by the names they are reachable under.
///
/// Implemented by the storage layer.
pub trait SiteDirectory {
    type Error;

    fn find_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = Result<Option<Site>, Self::Error>> + Send;

    fn find_by_custom_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Option<Site>, Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteLookup {
    Found(Site),
    /// The host names a tenant, but no site claims it.
    NotFound(HostResolution),
    Platform,
    Invalid,
}

/// Resolve a request host to the tenant site it addresses.
pub async fn resolve_site<D>(
    directory: &D,
    host: &str,
    config: &DomainConfig,
) -> Result<SiteLookup, D::Error>
where
    D: SiteDirectory + Sync,
{
    let resolution = resolve_host(host, config);
    let found = match &resolution {
        HostResolution::Platform => return Ok(SiteLookup::Platform),
        HostResolution::Invalid => return Ok(SiteLookup::Invalid),
        HostResolution::Subdomain(subdomain) => directory.find_by_subdomain(subdomain).await?,
        HostResolution::CustomDomain(domain) => directory.find_by_custom_domain(domain).await?,
    };
    debug!(host, found = found.is_some(), "resolved site host");
    Ok(match found {
        Some(site) => SiteLookup::Found(site),
        None => SiteLookup::NotFound(resolution),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    struct Directory {
        sites: HashMap<String, Site>,
    }

    impl Directory {
        fn new(sites: Vec<Site>) -> Self {
            let mut map = HashMap::new();
            for site in sites {
                if let Some(domain) = &site.custom_domain {
                    map.insert(domain.clone(), site.clone());
                }
                map.insert(site.subdomain.clone(), site);
            }
            Self { sites: map }
        }
    }

    impl SiteDirectory for Directory {
        type Error = Infallible;

        async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Site>, Infallible> {
            Ok(self.sites.get(subdomain).cloned())
        }

        async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Site>, Infallible> {
            Ok(self.sites.get(domain).cloned())
        }
    }

    #[tokio::test]
    async fn resolves_subdomain_and_custom_domain() {
        let site = Site::new("Green Leaf", "greenleaf").with_custom_domain("greenleaf.com");
        let dir = Directory::new(vec![site.clone()]);
        let cfg = DomainConfig::new("sites.test");

        let by_sub = resolve_site(&dir, "greenleaf.sites.test", &cfg).await.unwrap();
        assert_eq!(by_sub, SiteLookup::Found(site.clone()));

        let by_domain = resolve_site(&dir, "www.greenleaf.com:443", &cfg).await.unwrap();
        assert_eq!(by_domain, SiteLookup::Found(site));
    }

    #[tokio::test]
    async fn unknown_platform_and_invalid_hosts() {
        let dir = Directory::new(Vec::new());
        let cfg = DomainConfig::new("sites.test");

        assert_eq!(
            resolve_site(&dir, "nobody.sites.test", &cfg).await.unwrap(),
            SiteLookup::NotFound(HostResolution::Subdomain("nobody".to_string()))
        );
        assert_eq!(
            resolve_site(&dir, "sites.test", &cfg).await.unwrap(),
            SiteLookup::Platform
        );
        assert_eq!(
            resolve_site(&dir, "not a host", &cfg).await.unwrap(),
            SiteLookup::Invalid
        );
    }

    #[test]
    fn host_case_and_port_do_not_matter() {
        let site = Site::new("Green Leaf", "greenleaf");
        let dir = Directory::new(vec![site.clone()]);
        let cfg = DomainConfig::new("sites.test");

        let lookup = tokio_test::block_on(resolve_site(&dir, "GreenLeaf.Sites.Test:8080", &cfg));
        assert_eq!(tokio_test::assert_ok!(lookup), SiteLookup::Found(site));
    }
}
