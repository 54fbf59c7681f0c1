//! External identity and session-change types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity issued by the external identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-side user id (may be empty for email-only flows)
    pub id: String,
    pub email: String,
    /// Session expiry; `None` means the provider did not report one
    pub expires_at: Option<DateTime<Utc>>,
}

impl ExternalIdentity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            expires_at: None,
        }
    }

    /// Set the session expiry
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A session is expired once its expiry is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Check if the session is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Kind of session-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// First read of the persisted session at startup
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notification delivered by an identity session source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: SessionEvent,
    pub identity: Option<ExternalIdentity>,
}

impl SessionChange {
    pub fn initial(identity: Option<ExternalIdentity>) -> Self {
        Self {
            event: SessionEvent::InitialSession,
            identity,
        }
    }

    pub fn signed_in(identity: ExternalIdentity) -> Self {
        Self {
            event: SessionEvent::SignedIn,
            identity: Some(identity),
        }
    }

    pub fn refreshed(identity: ExternalIdentity) -> Self {
        Self {
            event: SessionEvent::TokenRefreshed,
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: SessionEvent::SignedOut,
            identity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let identity = ExternalIdentity::new("uid-1", "client@acme.com");
        assert!(!identity.is_expired_at(now));

        assert!(identity.clone().with_expiry(now).is_expired_at(now));
        assert!(identity
            .clone()
            .with_expiry(now - Duration::seconds(1))
            .is_expired_at(now));
        assert!(!identity
            .with_expiry(now + Duration::seconds(1))
            .is_expired_at(now));
    }

    #[test]
    fn test_signed_out_has_no_identity() {
        let change = SessionChange::signed_out();
        assert_eq!(change.event, SessionEvent::SignedOut);
        assert!(change.identity.is_none());
    }
}
