//! Configuration types for resolution, caching and the identity provider

use std::time::Duration;

/// Session gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Upper bound on a single directory lookup.
    /// Default: 10 seconds
    pub lookup_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

impl GateConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory lookup timeout
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

/// Configuration for the resolution cache.
///
/// Entries carry no TTL: a resolution stays valid until it is invalidated
/// by sign-out or an email change.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached resolutions.
    /// Default: 10,000
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached resolutions.
    #[must_use]
    pub fn with_max_entries(mut self, max: u64) -> Self {
        self.max_entries = max;
        self
    }
}

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider base URL (e.g., https://project.supabase.co)
    pub base_url: String,
    /// Public API key sent as the `apikey` header
    pub anon_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Build a URL under the GoTrue `/auth/v1` prefix
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url_strips_trailing_slash() {
        let config = ProviderConfig::new("http://localhost:9999/", "anon");
        assert_eq!(config.auth_url("/user"), "http://localhost:9999/auth/v1/user");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(GateConfig::default().lookup_timeout, Duration::from_secs(10));
        assert_eq!(CacheConfig::new().with_max_entries(5).max_entries, 5);
    }
}
