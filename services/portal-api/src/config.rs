//! Configuration for the portal API service.

use std::time::Duration;

use portal_auth_core::ProviderConfig;
use portal_db::PoolOptions;

/// Portal API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Connection pool tuning
    pub pool: PoolOptions,

    /// Identity provider endpoint and key
    pub provider: ProviderConfig,

    /// Request timeout for API routes
    pub request_timeout: Duration,

    /// Upper bound on a single role resolution
    pub lookup_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?;
        let http_port = parse_or(&var, "HTTP_PORT", 3000)?;

        let identity_url = var("IDENTITY_URL").ok_or(ConfigError::Missing("IDENTITY_URL"))?;
        if !identity_url.starts_with("http://") && !identity_url.starts_with("https://") {
            return Err(ConfigError::Invalid("IDENTITY_URL"));
        }
        let anon_key =
            var("IDENTITY_ANON_KEY").ok_or(ConfigError::Missing("IDENTITY_ANON_KEY"))?;

        let request_timeout_secs = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let lookup_timeout_secs = parse_or(&var, "LOOKUP_TIMEOUT_SECS", 10)?;

        let metrics_enabled = var("METRICS_ENABLED")
            .map(|v| v.parse().unwrap_or(true))
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            pool: PoolOptions {
                max_connections,
                ..PoolOptions::default()
            },
            provider: ProviderConfig::new(identity_url, anon_key),
            request_timeout: Duration::from_secs(request_timeout_secs),
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
            metrics_enabled,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
