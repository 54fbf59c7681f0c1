//! Error types for the portal API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_auth_core::{AuthError, ResolveError};
use portal_types::{Denial, PortalError};
use serde::Serialize;
use serde_json::json;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{}", .0.message())]
    Denied(Denial),

    #[error("Member not found")]
    MemberNotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("User directory unavailable")]
    Unavailable(String),

    #[error("Identity provider unavailable")]
    Provider(String),

    #[error("Database error")]
    Database(#[from] portal_db::DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::MemberNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Denied(denial) => denial.code(),
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unavailable(_) => "DIRECTORY_UNAVAILABLE",
            Self::Provider(_) => "IDENTITY_PROVIDER_ERROR",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Denied(Denial::RoleNotPermitted(role)) => Some(json!({ "role": role })),
            _ => None,
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MissingEmail => Self::BadRequest("Email is required".to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::InvalidCredentials => Self::InvalidToken,
            AuthError::Provider(msg) => Self::Provider(msg),
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Database(_) => {
                tracing::error!(error = ?self, "Internal API error");
            }
            Self::Unavailable(reason) | Self::Provider(reason) => {
                tracing::warn!(code = self.error_code(), %reason, "Upstream failure");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use portal_types::Role;

    #[test]
    fn test_denial_status_and_code() {
        let err = ApiError::Denied(Denial::RoleNotPermitted(Role::Agent));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "ROLE_NOT_PERMITTED");
        assert_eq!(err.details(), Some(json!({"role": "Agent"})));
        assert_eq!(
            err.to_string(),
            "Access denied. Only clients can log in to this application."
        );
    }

    #[test]
    fn test_resolve_error_mapping() {
        assert!(matches!(
            ApiError::from(ResolveError::MissingEmail),
            ApiError::BadRequest(_)
        ));
        let err = ApiError::from(ResolveError::Unavailable("pool timed out".into()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
