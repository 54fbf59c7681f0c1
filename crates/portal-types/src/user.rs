//! User types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::PortalError;

/// Internal user identifier (`users.id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i32);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Kind of person in the system of record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Outsourced staff member working for a client organization
    Agent,
    /// Customer-side user of the portal
    Client,
    /// Staff of the outsourcing company itself
    Internal,
}

impl Role {
    /// Whether this role may sign in to the client portal.
    ///
    /// Agents and internal staff are valid users elsewhere in the system but
    /// are rejected here.
    pub const fn can_access_portal(&self) -> bool {
        match self {
            Self::Client => true,
            Self::Agent | Self::Internal => false,
        }
    }

    /// Name as stored in `users.user_type`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Client => "Client",
            Self::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("agent") {
            Ok(Self::Agent)
        } else if s.eq_ignore_ascii_case("client") {
            Ok(Self::Client)
        } else if s.eq_ignore_ascii_case("internal") {
            Ok(Self::Internal)
        } else {
            Err(PortalError::InvalidRole(s.to_string()))
        }
    }
}

/// A person in the system of record, looked up by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalUser {
    pub id: UserId,
    pub email: String,
    #[serde(rename = "user_type")]
    pub role: Role,
}

impl InternalUser {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
        }
    }
}
