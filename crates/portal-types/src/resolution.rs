//! Role resolution outcomes

use serde::{Deserialize, Serialize, Serializer};

use crate::{InternalUser, Organization, Role};

/// A successful resolution: a permitted internal user and their organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub user: InternalUser,
    pub organization: Option<Organization>,
}

/// Why an identity was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// No internal user with this email
    NotFound,
    /// User exists but the role may not use the portal
    RoleNotPermitted(Role),
}

impl Denial {
    /// Short machine-facing reason
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "user not found",
            Self::RoleNotPermitted(_) => "role not permitted",
        }
    }

    /// Stable error code used on the wire
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "USER_NOT_FOUND",
            Self::RoleNotPermitted(_) => "ROLE_NOT_PERMITTED",
        }
    }

    /// Message shown to the person signing in
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NotFound => {
                "User not found. Please contact your administrator to create an account."
            }
            Self::RoleNotPermitted(_) => {
                "Access denied. Only clients can log in to this application."
            }
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of resolving an external identity against the system of record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Granted(Resolution),
    Denied(Denial),
}

impl ResolutionResult {
    pub fn granted(user: InternalUser, organization: Option<Organization>) -> Self {
        Self::Granted(Resolution { user, organization })
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    pub fn error_reason(&self) -> Option<&'static str> {
        match self {
            Self::Granted(_) => None,
            Self::Denied(denial) => Some(denial.reason()),
        }
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Granted(resolution) => Some(resolution),
            Self::Denied(_) => None,
        }
    }

    pub fn user(&self) -> Option<&InternalUser> {
        self.resolution().map(|r| &r.user)
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.resolution().and_then(|r| r.organization.as_ref())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionWire<'a> {
    valid: bool,
    internal_user: Option<&'a InternalUser>,
    associated_organization: Option<&'a Organization>,
    error_reason: Option<&'static str>,
}

impl Serialize for ResolutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResolutionWire {
            valid: self.is_valid(),
            internal_user: self.user(),
            associated_organization: self.organization(),
            error_reason: self.error_reason(),
        }
        .serialize(serializer)
    }
}
