//! Shared fixtures for router tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use dashmap::DashMap;
use portal_api::{build_router, AppState, Directory};
use portal_auth_core::{AuthError, IdentityProvider, ProviderSession};
use portal_db::{AttendanceRow, MemoryDirectory};
use portal_types::{ExternalIdentity, Role};
use serde_json::Value;
use tower::ServiceExt;

/// Identity provider that knows a fixed set of tokens
#[derive(Default)]
pub struct StaticProvider {
    tokens: DashMap<String, ExternalIdentity>,
}

impl StaticProvider {
    pub fn with_token(self, token: &str, email: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            ExternalIdentity::new(format!("ext-{token}"), email),
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn user_for_token(&self, access_token: &str) -> Result<ExternalIdentity, AuthError> {
        self.tokens
            .get(access_token)
            .map(|identity| identity.value().clone())
            .ok_or(AuthError::InvalidToken)
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<ProviderSession, AuthError> {
        Err(AuthError::InvalidCredentials)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Acme (member 3) with a client, two agents and an internal user;
/// Globex (member 4) with a client and an agent.
pub fn seeded_directory() -> MemoryDirectory {
    let dir = MemoryDirectory::new();
    dir.insert_member(3, "Acme");
    dir.insert_member(4, "Globex");

    dir.insert_user(7, "client@acme.com", Role::Client);
    dir.add_client(7, 3);
    dir.insert_user(8, "agent@acme.com", Role::Agent);
    dir.add_agent(8, 3, Some("Support"));
    dir.insert_user(11, "sales@acme.com", Role::Agent);
    dir.add_agent(11, 3, Some("Sales"));
    dir.insert_user(9, "staff@acme.com", Role::Internal);

    dir.insert_user(10, "client@globex.com", Role::Client);
    dir.add_client(10, 4);
    dir.insert_user(12, "agent@globex.com", Role::Agent);
    dir.add_agent(12, 4, None);

    dir.insert_attendance(attendance(1, 8, "2024-01-15", "present", "Support"));
    dir.insert_attendance(attendance(2, 11, "2024-01-15", "late", "Sales"));
    dir.insert_attendance(attendance(3, 8, "2024-01-16", "present", "Support"));
    dir.insert_attendance(attendance(4, 12, "2024-01-15", "absent", "Ops"));

    dir
}

fn attendance(id: i32, agent: i32, date: &str, status: &str, department: &str) -> AttendanceRow {
    AttendanceRow {
        id,
        employee_id: agent,
        employee_name: format!("Agent {agent}"),
        employee_email: format!("agent{agent}@example.com"),
        attendance_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        check_in_time: Some("09:00".to_string()),
        check_out_time: Some("17:00".to_string()),
        total_hours: 8.0,
        status: status.to_string(),
        department: Some(department.to_string()),
        job_title: None,
        notes: None,
    }
}

pub fn provider() -> StaticProvider {
    StaticProvider::default()
        .with_token("client-token", "client@acme.com")
        .with_token("agent-token", "agent@acme.com")
        .with_token("globex-token", "client@globex.com")
        .with_token("ghost-token", "ghost@acme.com")
}

pub fn app(dir: &MemoryDirectory) -> Router {
    let state = AppState::new(Directory::shared(Arc::new(dir.clone())), Arc::new(provider()));
    build_router(state, None)
}

/// Send a request and decode the JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
