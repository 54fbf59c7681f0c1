//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use portal_types::{InternalUser, Organization, ResolutionResult};

use crate::error::ApiError;
use crate::state::AppState;

/// Caller holding a valid provider token who resolves to a permitted client
#[derive(Debug, Clone)]
pub struct ClientCaller {
    pub user: InternalUser,
    pub organization: Option<Organization>,
}

impl ClientCaller {
    /// Member the caller belongs to
    pub fn member_id(&self) -> Result<i32, ApiError> {
        self.organization
            .as_ref()
            .map(|org| org.id.0)
            .ok_or(ApiError::MemberNotFound)
    }
}

impl<S> FromRequestParts<S> for ClientCaller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let identity = app_state.provider.user_for_token(token).await.map_err(|e| {
            tracing::debug!(error = ?e, "Token validation failed");
            ApiError::from(e)
        })?;

        match app_state.resolve(&identity.id, &identity.email).await? {
            ResolutionResult::Granted(resolution) => Ok(Self {
                user: resolution.user,
                organization: resolution.organization,
            }),
            ResolutionResult::Denied(denial) => {
                tracing::warn!(email = %identity.email, reason = %denial, "Caller refused");
                Err(ApiError::Denied(denial))
            }
        }
    }
}

/// Extract the bearer token from the Authorization header
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)
}
