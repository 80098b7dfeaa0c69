use std::env;

/// Configuration for one dispatcher process, populated once at startup and
/// injected into the dispatch routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub cdn_distribution_id: Option<String>,
    pub purge_email: String,
    pub purge_api_key: String,
    pub purge_zone_id: String,
    pub public_domain: String,
}

impl DispatcherConfig {
    /// Reads the process environment. Purge credentials are not validated
    /// here; absent values surface as failures on the purge call itself.
    pub fn from_env() -> Self {
        Self {
            cdn_distribution_id: env::var("CloudFrontDistribution").ok(),
            purge_email: env::var("Email").unwrap_or_default(),
            purge_api_key: env::var("Key").unwrap_or_default(),
            purge_zone_id: env::var("Zone").unwrap_or_default(),
            public_domain: env::var("Domain").unwrap_or_default(),
        }
    }

    /// The CDN distribution to invalidate, if one is configured.
    /// A blank value disables the CDN-invalidation path entirely.
    pub fn cdn_distribution(&self) -> Option<&str> {
        self.cdn_distribution_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
