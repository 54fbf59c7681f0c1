//! Resolution cache
//!
//! Positive resolutions keyed by email. Concurrent lookups for the same
//! email are coalesced so the directory sees one query; denials and
//! failures are handed back to every waiter but never stored.
//!
//! # Usage
//!
//! ```ignore
//! use portal_auth_core::{CacheConfig, ResolutionCache};
//!
//! let cache = ResolutionCache::new(CacheConfig::default());
//! let result = cache
//!     .get_or_resolve("client@acme.com", || resolver.resolve("", "client@acme.com"))
//!     .await?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use moka::future::Cache;
use portal_types::{Denial, Resolution, ResolutionResult};
use tracing::instrument;

use crate::config::CacheConfig;
use crate::error::ResolveError;

/// Outcomes that are returned to callers but not stored
#[derive(Debug)]
enum Uncached {
    Denied(Denial),
    Failed(ResolveError),
}

/// Email-keyed cache of granted resolutions.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct ResolutionCache {
    entries: Cache<String, Resolution>,
    config: CacheConfig,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("config", &self.config)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResolutionCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = Cache::builder().max_capacity(config.max_entries).build();
        Self { entries, config }
    }

    /// Cached resolution for an email
    pub async fn get(&self, email: &str) -> Option<Resolution> {
        self.entries.get(email).await
    }

    /// Store a result. Only granted results are kept; returns whether the
    /// result was stored.
    pub async fn put(&self, email: &str, result: &ResolutionResult) -> bool {
        match result {
            ResolutionResult::Granted(resolution) => {
                self.entries
                    .insert(email.to_string(), resolution.clone())
                    .await;
                true
            }
            ResolutionResult::Denied(_) => false,
        }
    }

    /// Drop the entry for an email
    pub async fn invalidate(&self, email: &str) {
        self.entries.invalidate(email).await;
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Number of cached resolutions (approximate until pending tasks run)
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Cached result for `email`, or the result of `lookup`.
    ///
    /// While a lookup for `email` is running, other callers for the same
    /// email wait for it instead of starting their own. A granted result is
    /// cached; a denial or error is returned to every waiter and the next
    /// call looks up again.
    #[instrument(skip(self, lookup), level = "debug")]
    pub async fn get_or_resolve<F, Fut>(
        &self,
        email: &str,
        lookup: F,
    ) -> Result<ResolutionResult, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResolutionResult, ResolveError>>,
    {
        if let Some(cached) = self.entries.get(email).await {
            tracing::debug!("resolution cache hit");
            metrics::counter!("portal_resolution_cache_hits").increment(1);
            return Ok(ResolutionResult::Granted(cached));
        }

        let looked_up = AtomicBool::new(false);
        let init = async {
            looked_up.store(true, Ordering::Relaxed);
            match lookup().await {
                Ok(ResolutionResult::Granted(resolution)) => Ok(resolution),
                Ok(ResolutionResult::Denied(denial)) => Err(Uncached::Denied(denial)),
                Err(err) => Err(Uncached::Failed(err)),
            }
        };

        let outcome = self.entries.try_get_with(email.to_string(), init).await;

        if looked_up.load(Ordering::Relaxed) {
            metrics::counter!("portal_resolution_cache_misses").increment(1);
        } else {
            tracing::debug!("joined in-flight resolution");
            metrics::counter!("portal_resolution_cache_hits").increment(1);
        }

        match outcome {
            Ok(resolution) => Ok(ResolutionResult::Granted(resolution)),
            Err(uncached) => match uncached.as_ref() {
                Uncached::Denied(denial) => Ok(ResolutionResult::Denied(*denial)),
                Uncached::Failed(err) => Err(err.clone()),
            },
        }
    }
}
