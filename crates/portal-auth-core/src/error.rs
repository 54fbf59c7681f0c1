//! Auth errors

use std::time::Duration;

use thiserror::Error;

/// Identity provider errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid or expired token (rejected by the identity provider)
    #[error("invalid token")]
    InvalidToken,

    /// Invalid credentials (wrong password, etc.)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Identity provider unreachable or misbehaving
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken | Self::InvalidCredentials => 401,
            Self::Provider(_) => 502,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Provider(_) => "IDENTITY_PROVIDER_ERROR",
        }
    }
}

/// Failure to reach a decision about an identity.
///
/// Denials (unknown user, role not permitted) are not errors; they are
/// carried in [`portal_types::ResolutionResult`]. Everything here is either
/// bad input, a transient failure worth retrying, or a superseded attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Email missing or blank
    #[error("email is required")]
    MissingEmail,

    /// Lookup did not finish within the configured timeout
    #[error("directory lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Directory store unreachable
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// Directory returned data that does not map onto a user
    #[error("malformed directory data: {0}")]
    Malformed(String),

    /// Identity changed while the lookup was in flight
    #[error("identity changed while resolving {0}")]
    StaleIdentity(String),
}

impl ResolveError {
    /// Retrying on the next session event may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Unavailable(_) | Self::Malformed(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingEmail => "MISSING_EMAIL",
            Self::Timeout(_) | Self::Unavailable(_) | Self::Malformed(_) => {
                "DIRECTORY_UNAVAILABLE"
            }
            Self::StaleIdentity(_) => "STALE_IDENTITY",
        }
    }
}

impl From<portal_db::DbError> for ResolveError {
    fn from(err: portal_db::DbError) -> Self {
        match err {
            portal_db::DbError::InvalidData(msg) => {
                tracing::error!(error = %msg, "malformed directory row");
                Self::Malformed(msg)
            }
            other => {
                tracing::error!(error = %other, "directory lookup failed");
                Self::Unavailable(other.to_string())
            }
        }
    }
}
