//! Retry with exponential backoff
//!
//! Read-only portal calls are retried on transient failures; writes are not.
//!
//! # Example
//!
//! ```ignore
//! use portal_client::retry::{with_retry, RetryConfig};
//!
//! let employees = with_retry(RetryConfig::default(), || async {
//!     client.employees(token).await
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (excluding the initial request).
    pub max_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to add jitter to prevent thundering herd.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, enable: bool) -> Self {
        self.add_jitter = enable;
        self
    }

    /// Delay before retry number `attempt` (0-based): `base_delay * 2^attempt`,
    /// capped at `max_delay`, plus up to 25% jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(multiplier);
        let delay = Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64));

        if !self.add_jitter {
            return delay;
        }

        let jitter_range = delay.as_millis() as u64 / 4;
        if jitter_range == 0 {
            return delay;
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        delay + Duration::from_millis(nanos % jitter_range)
    }
}

/// Retry policy that determines whether to retry a request.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.config.delay_for_attempt(attempt)
    }

    #[must_use]
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.config.max_attempts
    }

    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

/// Run `operation`, retrying retryable errors with backoff.
pub async fn with_retry<F, Fut, T, E>(config: RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let policy = RetryPolicy::new(config);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() && policy.can_retry(attempt) => {
                let delay = policy.retry_delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.config().max_attempts,
                    delay_ms = delay.as_millis(),
                    "retrying after transient error"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Errors that know whether a retry may succeed
pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

impl RetryableError for crate::ClientError {
    fn is_retryable(&self) -> bool {
        crate::ClientError::is_retryable(self)
    }
}
