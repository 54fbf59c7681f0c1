//! Access validation handlers
//!
//! The desktop client calls these right after sign-in to learn whether the
//! identity may use the portal.

use axum::extract::{Query, State};
use axum::Json;
use portal_types::{InternalUser, Organization, ResolutionResult};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserTypeQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserTypeResponse {
    pub user: Option<InternalUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessRequest {
    #[serde(default)]
    pub supabase_user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateAccessResponse {
    pub message: &'static str,
    pub user: InternalUser,
    pub member: Option<Organization>,
}

fn required_email(email: Option<&str>) -> ApiResult<&str> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))
}

/// GET /api/user-type?email=
///
/// Look up the internal user for an email without any role check
#[instrument(skip(state))]
pub async fn get_user_type(
    State(state): State<AppState>,
    Query(query): Query<UserTypeQuery>,
) -> ApiResult<Json<UserTypeResponse>> {
    let email = required_email(query.email.as_deref())?;

    let user = match state.directory.users.find_by_email(email).await? {
        Some(row) => Some(row.to_internal_user()?),
        None => None,
    };

    Ok(Json(UserTypeResponse { user }))
}

/// POST /api/user-type
///
/// Run the role check for a freshly signed-in identity
#[instrument(skip_all)]
pub async fn validate_access(
    State(state): State<AppState>,
    Json(req): Json<ValidateAccessRequest>,
) -> ApiResult<Json<ValidateAccessResponse>> {
    let email = required_email(req.email.as_deref())?;
    let external_id = req.supabase_user_id.as_deref().unwrap_or_default();

    let result = state.resolve(external_id, email).await;
    let outcome = match &result {
        Ok(ResolutionResult::Granted(_)) => "granted",
        Ok(ResolutionResult::Denied(_)) => "denied",
        Err(_) => "error",
    };
    metrics::counter!("portal_access_checks_total", "outcome" => outcome).increment(1);

    match result? {
        ResolutionResult::Granted(resolution) => Ok(Json(ValidateAccessResponse {
            message: "Client access validated successfully",
            user: resolution.user,
            member: resolution.organization,
        })),
        ResolutionResult::Denied(denial) => Err(ApiError::Denied(denial)),
    }
}
