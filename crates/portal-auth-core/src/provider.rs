//! Identity provider client
//!
//! Talks to a GoTrue-compatible auth REST API: token introspection,
//! password sign-in and sign-out.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use portal_types::ExternalIdentity;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::ProviderConfig;
use crate::error::AuthError;

/// Session issued by the provider after sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub identity: ExternalIdentity,
}

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity behind an access token
    async fn user_for_token(&self, access_token: &str) -> Result<ExternalIdentity, AuthError>;

    /// Exchange email and password for a session
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, AuthError>;

    /// Revoke a session at the provider
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

impl TokenResponse {
    fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + ChronoDuration::seconds(secs))
            })
    }
}

/// HTTP identity provider
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpIdentityProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// Create a provider with a custom HTTP client
    pub fn with_client(config: ProviderConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    error!(error = %err, "identity provider request failed");
    AuthError::Provider(err.to_string())
}

async fn unexpected_status(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %body, "identity provider error");
    AuthError::Provider(format!("identity provider returned {status}"))
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip_all)]
    async fn user_for_token(&self, access_token: &str) -> Result<ExternalIdentity, AuthError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("provider rejected access token");
                return Err(AuthError::InvalidToken);
            }
            _ => return Err(unexpected_status(response).await),
        }

        let user: UserResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse provider user");
            AuthError::Provider(e.to_string())
        })?;

        Ok(ExternalIdentity::new(user.id, user.email.unwrap_or_default()))
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("provider rejected credentials");
                return Err(AuthError::InvalidCredentials);
            }
            _ => return Err(unexpected_status(response).await),
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse provider session");
            AuthError::Provider(e.to_string())
        })?;

        let mut identity = ExternalIdentity::new(
            token.user.id.clone(),
            token.user.email.clone().unwrap_or_else(|| email.to_string()),
        );
        if let Some(expires_at) = token.expiry(Utc::now()) {
            identity = identity.with_expiry(expires_at);
        }

        Ok(ProviderSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            identity,
        })
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken),
            _ => Err(unexpected_status(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_prefers_absolute_timestamp() {
        let now = Utc::now();
        let token = TokenResponse {
            access_token: "t".into(),
            refresh_token: None,
            expires_in: Some(3600),
            expires_at: Some(1_700_000_000),
            user: UserResponse {
                id: "u".into(),
                email: None,
            },
        };
        assert_eq!(
            token.expiry(now),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn test_expiry_from_relative_seconds() {
        let now = Utc::now();
        let token = TokenResponse {
            access_token: "t".into(),
            refresh_token: None,
            expires_in: Some(60),
            expires_at: None,
            user: UserResponse {
                id: "u".into(),
                email: None,
            },
        };
        assert_eq!(token.expiry(now), Some(now + ChronoDuration::seconds(60)));
    }
}
