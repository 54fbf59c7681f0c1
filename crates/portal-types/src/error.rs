//! Common error types

use thiserror::Error;

/// Parsing and validation errors for portal domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// Unknown user role
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Unknown attendance status
    #[error("invalid attendance status: {0}")]
    InvalidAttendanceStatus(String),

    /// Date not in `YYYY-MM-DD` form
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Time of day not in `HH:MM` or `HH:MM:SS` form
    #[error("invalid time: {0}")]
    InvalidTime(String),
}
