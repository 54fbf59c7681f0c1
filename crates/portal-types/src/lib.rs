//! Portal Types - Shared domain types
//!
//! This crate contains domain types used across the portal crates:
//! - Internal users, roles and organizations
//! - External identities and session-change events
//! - Role resolution outcomes
//! - Roster, break-session and attendance records

pub mod attendance;
pub mod error;
pub mod identity;
pub mod organization;
pub mod resolution;
pub mod roster;
pub mod user;

pub use attendance::*;
pub use error::*;
pub use identity::*;
pub use organization::*;
pub use resolution::*;
pub use roster::*;
pub use user::*;
