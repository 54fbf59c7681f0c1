//! HTTP identity provider against a mock GoTrue server

use chrono::Utc;
use portal_auth_core::{AuthError, HttpIdentityProvider, IdentityProvider, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn provider(server: &MockServer) -> HttpIdentityProvider {
    HttpIdentityProvider::new(ProviderConfig::new(server.uri(), "anon-key"))
}

#[tokio::test]
async fn user_for_token_returns_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "0b7c-ext",
            "email": "client@acme.com",
            "role": "authenticated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = provider(&server)
        .await
        .user_for_token("good-token")
        .await
        .unwrap();
    assert_eq!(identity.id, "0b7c-ext");
    assert_eq!(identity.email, "client@acme.com");
}

#[tokio::test]
async fn rejected_token_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .await
        .user_for_token("bad-token")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn provider_outage_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = provider(&server)
        .await
        .user_for_token("token")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Provider(_)));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn password_sign_in_returns_session_with_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({
            "email": "client@acme.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "0b7c-ext", "email": "client@acme.com" }
        })))
        .mount(&server)
        .await;

    let before = Utc::now();
    let session = provider(&server)
        .await
        .sign_in_with_password("client@acme.com", "hunter2")
        .await
        .unwrap();

    assert_eq!(session.access_token, "access");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
    assert_eq!(session.identity.email, "client@acme.com");
    let expires_at = session.identity.expires_at.unwrap();
    assert!(expires_at > before + chrono::Duration::minutes(59));
    assert!(!session.identity.is_expired());
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .await
        .sign_in_with_password("client@acme.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn sign_out_posts_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server).await.sign_out("access").await.unwrap();
}
