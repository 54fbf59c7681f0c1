//! Client errors
//!
//! Error types for portal client operations, mapped from HTTP status codes
//! and the API's `{ "error": { "code", "message", "details" } }` body.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use portal_auth_core::AuthError;

/// Error body returned by the portal API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Client errors for portal operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection error - failed to reach the server.
    #[error("connection error: {message}")]
    Connection {
        /// Error message
        message: String,
        /// Whether the error is retryable
        retryable: bool,
    },

    /// Request timeout.
    #[error("request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Authentication required - token missing, expired or rejected.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// Refused by the portal; `code` is the API error code.
    #[error("permission denied: {message}")]
    PermissionDenied {
        code: String,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Server-side error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Service unavailable - server or its directory is temporarily down.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { retryable, .. } => *retryable,
            Self::Timeout(_) | Self::Unavailable(_) => true,
            Self::Unauthenticated(_)
            | Self::PermissionDenied { .. }
            | Self::NotFound(_)
            | Self::InvalidArgument(_)
            | Self::Internal(_)
            | Self::Config(_)
            | Self::Serialization(_) => false,
        }
    }

    /// API error code, when the server sent one
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>, retryable: bool) -> Self {
        Self::Connection {
            message: message.into(),
            retryable,
        }
    }

    /// Map a non-success response onto an error
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| ErrorBody {
                code: status.as_str().to_string(),
                message: if text.is_empty() {
                    status.to_string()
                } else {
                    text
                },
                details: None,
            });
        Self::from_status(status, body)
    }

    pub(crate) fn from_status(status: StatusCode, body: ErrorBody) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::InvalidArgument(body.message)
            }
            StatusCode::UNAUTHORIZED => Self::Unauthenticated(body.message),
            StatusCode::FORBIDDEN => Self::PermissionDenied {
                code: body.code,
                message: body.message,
                details: body.details,
            },
            StatusCode::NOT_FOUND => Self::NotFound(body.message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Self::Timeout(std::time::Duration::ZERO)
            }
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE => Self::Unavailable(body.message),
            _ => Self::Internal(format!("{status}: {}", body.message)),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(std::time::Duration::ZERO)
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_builder() {
            Self::connection(err.to_string(), false)
        } else {
            Self::connection(err.to_string(), true)
        }
    }
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::Unauthenticated(err.to_string())
            }
            AuthError::Provider(message) => Self::Unavailable(message),
        }
    }
}
