//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Row contents that do not map onto a domain value
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<portal_types::PortalError> for DbError {
    fn from(err: portal_types::PortalError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;
