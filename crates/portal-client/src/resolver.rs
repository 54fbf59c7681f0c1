//! Role resolution through the portal API

use async_trait::async_trait;
use portal_auth_core::{ResolveError, RoleResolver};
use portal_types::{Denial, ResolutionResult, Role};
use tracing::warn;

use crate::api::PortalClient;
use crate::error::ClientError;

/// [`RoleResolver`] that asks the portal API instead of the database
#[derive(Clone, Debug)]
pub struct HttpRoleResolver {
    client: PortalClient,
}

impl HttpRoleResolver {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }
}

fn denied_role(details: Option<&serde_json::Value>) -> Result<Role, ResolveError> {
    details
        .and_then(|d| d.get("role"))
        .and_then(|r| r.as_str())
        .ok_or_else(|| ResolveError::Malformed("denial without role".to_string()))?
        .parse()
        .map_err(|e: portal_types::PortalError| ResolveError::Malformed(e.to_string()))
}

#[async_trait]
impl RoleResolver for HttpRoleResolver {
    async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        let email = portal_auth_core::normalize_email(email)?;

        match self.client.validate_access(external_id, email).await {
            Ok(grant) => Ok(ResolutionResult::granted(grant.user, grant.member)),
            Err(ClientError::PermissionDenied { code, details, .. }) => match code.as_str() {
                "USER_NOT_FOUND" => Ok(ResolutionResult::Denied(Denial::NotFound)),
                "ROLE_NOT_PERMITTED" => Ok(ResolutionResult::Denied(Denial::RoleNotPermitted(
                    denied_role(details.as_ref())?,
                ))),
                other => Err(ResolveError::Malformed(format!("unknown denial code {other}"))),
            },
            Err(ClientError::InvalidArgument(_)) => Err(ResolveError::MissingEmail),
            Err(ClientError::Timeout(duration)) => Err(ResolveError::Timeout(duration)),
            Err(ClientError::Serialization(msg)) => Err(ResolveError::Malformed(msg)),
            Err(err) => {
                warn!(error = %err, "portal access check failed");
                Err(ResolveError::Unavailable(err.to_string()))
            }
        }
    }
}
