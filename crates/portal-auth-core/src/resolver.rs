//! Role resolution
//!
//! Turns an external identity (provider id + email) into an access decision
//! by consulting the internal user directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portal_db::{MemberRepository, UserRepository};
use portal_types::{Denial, ResolutionResult};
use tracing::{info, instrument, warn};

use crate::cache::ResolutionCache;
use crate::config::GateConfig;
use crate::error::ResolveError;

/// Decide whether an external identity may use the portal
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Resolve an identity. `external_id` may be empty; `email` is required.
    ///
    /// Unknown users and non-client roles come back as
    /// [`ResolutionResult::Denied`]; `Err` is reserved for failures to reach
    /// a decision.
    async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError>;
}

#[async_trait]
impl<R: RoleResolver + ?Sized> RoleResolver for Arc<R> {
    async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        (**self).resolve(external_id, email).await
    }
}

/// Trim an email and reject it when blank.
///
/// Case is preserved; the directory stores emails as entered.
pub fn normalize_email(email: &str) -> Result<&str, ResolveError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ResolveError::MissingEmail);
    }
    Ok(email)
}

/// Resolver backed by the user and member repositories
pub struct DirectoryResolver<U: ?Sized, M: ?Sized> {
    users: Arc<U>,
    members: Arc<M>,
}

impl<U, M> DirectoryResolver<U, M>
where
    U: UserRepository + ?Sized,
    M: MemberRepository + ?Sized,
{
    pub fn new(users: Arc<U>, members: Arc<M>) -> Self {
        Self { users, members }
    }
}

#[async_trait]
impl<U, M> RoleResolver for DirectoryResolver<U, M>
where
    U: UserRepository + ?Sized,
    M: MemberRepository + ?Sized,
{
    #[instrument(skip(self), fields(email = %email))]
    async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        let email = normalize_email(email)?;

        let Some(row) = self.users.find_by_email(email).await? else {
            warn!("no internal user for email");
            return Ok(ResolutionResult::Denied(Denial::NotFound));
        };

        let user = row.to_internal_user()?;
        if !user.role.can_access_portal() {
            warn!(user_id = %user.id, role = %user.role, "role not permitted");
            return Ok(ResolutionResult::Denied(Denial::RoleNotPermitted(user.role)));
        }

        let organization = self.members.organization_for_user(user.id.0).await?;
        info!(
            user_id = %user.id,
            member_id = ?organization.as_ref().map(|o| o.id.0),
            "identity resolved"
        );
        Ok(ResolutionResult::granted(user, organization))
    }
}

/// Resolver with a single-flight cache and a lookup timeout in front
pub struct CachedResolver<R: ?Sized> {
    cache: ResolutionCache,
    lookup_timeout: Duration,
    inner: Arc<R>,
}

impl<R: RoleResolver + ?Sized> CachedResolver<R> {
    pub fn new(inner: Arc<R>, cache: ResolutionCache, config: &GateConfig) -> Self {
        Self {
            cache,
            lookup_timeout: config.lookup_timeout,
            inner,
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Resolve through the cache, committing a granted result only while
    /// `is_current(email)` still holds once the lookup completes.
    ///
    /// A result computed for an identity that has since been replaced comes
    /// back as [`ResolveError::StaleIdentity`] and is not cached.
    #[instrument(skip(self, is_current), fields(email = %email))]
    pub async fn resolve_for<C>(
        &self,
        external_id: &str,
        email: &str,
        is_current: C,
    ) -> Result<ResolutionResult, ResolveError>
    where
        C: Fn(&str) -> bool + Send + Sync,
    {
        let email = normalize_email(email)?;
        let timeout = self.lookup_timeout;

        self.cache
            .get_or_resolve(email, || async {
                let result =
                    tokio::time::timeout(timeout, self.inner.resolve(external_id, email))
                        .await
                        .map_err(|_| {
                            warn!(?timeout, "directory lookup timed out");
                            ResolveError::Timeout(timeout)
                        })??;

                if !is_current(email) {
                    return Err(ResolveError::StaleIdentity(email.to_string()));
                }
                Ok(result)
            })
            .await
    }
}

#[async_trait]
impl<R: RoleResolver + ?Sized> RoleResolver for CachedResolver<R> {
    async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        self.resolve_for(external_id, email, |_| true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Client@Acme.com ").unwrap(), "Client@Acme.com");
        assert_eq!(normalize_email("   "), Err(ResolveError::MissingEmail));
        assert_eq!(normalize_email(""), Err(ResolveError::MissingEmail));
    }
}
