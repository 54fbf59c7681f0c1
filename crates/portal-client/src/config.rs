//! Client configuration

use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryConfig;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("portal endpoint is required")]
    MissingEndpoint,

    #[error("invalid portal endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    endpoint: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    retry: RetryConfig,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration with defaults for a single endpoint
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder().endpoint(endpoint).build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Default bearer token for authenticated calls
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    endpoint: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    retry: RetryConfig,
    bearer_token: Option<String>,
}

impl ClientConfigBuilder {
    /// Portal API base URL
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry = self.retry.with_max_attempts(attempts);
        self
    }

    #[must_use]
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry = self.retry.with_base_delay(delay);
        self
    }

    #[must_use]
    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.retry = self.retry.with_max_delay(delay);
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let endpoint = self
            .endpoint
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }

        Ok(ClientConfig {
            endpoint,
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(5)),
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(30)),
            retry: self.retry,
            bearer_token: self.bearer_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::new("http://localhost:3000/").unwrap();
        assert_eq!(config.endpoint(), "http://localhost:3000");
        assert_eq!(config.url("/api/company"), "http://localhost:3000/api/company");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn test_builder_rejects_bad_endpoints() {
        assert_eq!(
            ClientConfig::builder().build().unwrap_err(),
            ConfigError::MissingEndpoint
        );
        assert!(matches!(
            ClientConfig::new("localhost:3000"),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_bearer_token_is_redacted() {
        let config = ClientConfig::builder()
            .endpoint("http://localhost:3000")
            .bearer_token("super-secret")
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
