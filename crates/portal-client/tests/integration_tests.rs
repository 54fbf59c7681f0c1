//! Client SDK and session facade against mock portal and identity servers

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use portal_auth_core::{
    CacheConfig, CachedResolver, DeniedReason, GateConfig, GateState, HttpIdentityProvider,
    ProviderConfig, ResolutionCache, ResolveError, RoleResolver,
};
use portal_client::{
    AttendanceQuery, ClientConfig, ClientError, HttpRoleResolver, PortalClient, PortalSession,
};
use portal_types::{AttendanceStatus, Denial, NewAttendance, ResolutionResult, Role, UserId};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn client(server: &MockServer) -> PortalClient {
    let config = ClientConfig::builder()
        .endpoint(server.uri())
        .retry_attempts(3)
        .retry_base_delay(Duration::from_millis(5))
        .retry_max_delay(Duration::from_millis(20))
        .build()
        .unwrap();
    PortalClient::new(config).unwrap()
}

fn granted_body(email: &str) -> serde_json::Value {
    json!({
        "message": "Client access validated successfully",
        "user": {"id": 7, "email": email, "user_type": "Client"},
        "member": {"id": 3, "company": "Acme", "website": []}
    })
}

fn denied_body(code: &str, role: Option<&str>) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "message": "Access denied. Only clients can log in to this application.",
            "details": role.map(|r| json!({"role": r}))
        }
    })
}

async fn mount_access(server: &MockServer, email: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/user-type"))
        .and(body_partial_json(json!({"email": email})))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn validate_access_returns_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user-type"))
        .and(body_partial_json(
            json!({"supabaseUserId": "ext-7", "email": "client@acme.com"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(granted_body("client@acme.com")))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server)
        .validate_access("ext-7", "client@acme.com")
        .await
        .unwrap();
    assert_eq!(grant.user.id, UserId(7));
    assert_eq!(grant.user.role, Role::Client);
    assert_eq!(grant.member.unwrap().name, "Acme");
}

#[tokio::test]
async fn http_resolver_maps_denials() {
    let server = MockServer::start().await;
    mount_access(
        &server,
        "agent@acme.com",
        ResponseTemplate::new(403).set_body_json(denied_body("ROLE_NOT_PERMITTED", Some("Agent"))),
    )
    .await;
    mount_access(
        &server,
        "ghost@acme.com",
        ResponseTemplate::new(403).set_body_json(denied_body("USER_NOT_FOUND", None)),
    )
    .await;

    let resolver = HttpRoleResolver::new(client(&server));
    assert_eq!(
        resolver.resolve("ext-8", "agent@acme.com").await,
        Ok(ResolutionResult::Denied(Denial::RoleNotPermitted(Role::Agent)))
    );
    assert_eq!(
        resolver.resolve("", "ghost@acme.com").await,
        Ok(ResolutionResult::Denied(Denial::NotFound))
    );
}

#[tokio::test]
async fn http_resolver_reports_outage_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user-type"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": "DIRECTORY_UNAVAILABLE", "message": "directory unavailable"}
        })))
        .mount(&server)
        .await;

    let err = HttpRoleResolver::new(client(&server))
        .resolve("ext-7", "client@acme.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Unavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn http_resolver_rejects_blank_email_locally() {
    let server = MockServer::start().await;
    let err = HttpRoleResolver::new(client(&server))
        .resolve("ext-7", "   ")
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::MissingEmail);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn company_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/company"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/company"))
        .and(header("authorization", "Bearer token-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "company": "Acme",
            "country": "US",
            "website": ["https://acme.example"]
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let org = client(&server).company("token-7").await.unwrap();
    assert_eq!(org.name, "Acme");
    assert_eq!(org.website, vec!["https://acme.example".to_string()]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn unauthenticated_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "INVALID_TOKEN", "message": "invalid token"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).employees("stale").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated(_)));
}

#[tokio::test]
async fn attendance_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance"))
        .and(query_param("date", "2024-01-15"))
        .and(query_param("status", "late"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attendance": [{
                "id": 1,
                "employee_id": 8,
                "employee_name": "Agent Smith",
                "employee_email": "agent@acme.com",
                "date": "2024-01-15",
                "check_in_time": "09:20",
                "check_out_time": "17:00",
                "total_hours": 7.67,
                "status": "late",
                "department": "Support",
                "job_title": null,
                "notes": null
            }],
            "stats": {
                "total": 1, "present": 0, "absent": 0, "late": 1,
                "halfDay": 0, "leave": 0, "presentPercentage": 0
            },
            "success": true
        })))
        .mount(&server)
        .await;

    let query = AttendanceQuery {
        date: Some("2024-01-15".into()),
        status: Some(AttendanceStatus::Late),
        department: None,
    };
    let report = client(&server).attendance("token-7", &query).await.unwrap();
    assert_eq!(report.attendance.len(), 1);
    assert_eq!(report.attendance[0].status, AttendanceStatus::Late);
    assert_eq!(report.stats.late, 1);
}

#[tokio::test]
async fn record_attendance_returns_created_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/attendance"))
        .and(body_partial_json(json!({"employee_id": 8, "date": "2024-01-15"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attendance": {
                "id": 11,
                "employee_id": 8,
                "employee_name": "Agent Smith",
                "employee_email": "agent@acme.com",
                "date": "2024-01-15",
                "check_in_time": "09:00",
                "check_out_time": "17:00",
                "total_hours": 8.0,
                "status": "present",
                "department": "Support",
                "job_title": null,
                "notes": null
            },
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entry = NewAttendance {
        employee_id: UserId(8),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        check_in_time: Some("09:00".into()),
        check_out_time: Some("17:00".into()),
        status: AttendanceStatus::Present,
        notes: None,
    };
    let record = client(&server)
        .record_attendance("token-7", &entry)
        .await
        .unwrap();
    assert_eq!(record.id, 11);
    assert_eq!(record.total_hours, 8.0);
}

// Session facade

async fn mount_token(server: &MockServer, email: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(json!({"email": email})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "refresh_token": "refresh",
            "expires_at": (Utc::now() + chrono::Duration::hours(1)).timestamp(),
            "user": {"id": format!("ext-{token}"), "email": email}
        })))
        .mount(server)
        .await;
}

fn session(identity: &MockServer, portal: &MockServer) -> PortalSession {
    let provider = Arc::new(HttpIdentityProvider::new(ProviderConfig::new(
        identity.uri(),
        "anon-key",
    )));
    let resolver = Arc::new(CachedResolver::new(
        Arc::new(HttpRoleResolver::new(client(portal))),
        ResolutionCache::new(CacheConfig::default()),
        &GateConfig::default(),
    ));
    PortalSession::start(provider, resolver, None)
}

#[tokio::test]
async fn login_authorizes_client() {
    let identity = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_token(&identity, "client@acme.com", "token-7").await;
    mount_access(
        &portal,
        "client@acme.com",
        ResponseTemplate::new(200).set_body_json(granted_body("client@acme.com")),
    )
    .await;

    let session = session(&identity, &portal);
    session.login("client@acme.com", "secret").await.unwrap();

    let state = tokio::time::timeout(WAIT, session.wait_for(GateState::is_authorized))
        .await
        .unwrap()
        .unwrap();
    let GateState::Authorized(resolution) = state else {
        panic!("expected authorized, got {state:?}");
    };
    assert_eq!(resolution.user.email, "client@acme.com");
    assert_eq!(session.access_token().await.as_deref(), Some("token-7"));
    assert!(session.view().authorized);

    session.shutdown().await;
}

#[tokio::test]
async fn denied_login_signs_out_at_provider() {
    let identity = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_token(&identity, "agent@acme.com", "token-8").await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer token-8"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&identity)
        .await;
    mount_access(
        &portal,
        "agent@acme.com",
        ResponseTemplate::new(403).set_body_json(denied_body("ROLE_NOT_PERMITTED", Some("Agent"))),
    )
    .await;

    let session = session(&identity, &portal);
    session.login("agent@acme.com", "secret").await.unwrap();

    tokio::time::timeout(WAIT, async {
        while session.access_token().await.is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    tokio::time::timeout(
        WAIT,
        session.wait_for(|s| matches!(s, GateState::Unauthenticated)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(
        session.last_denial().await,
        Some(DeniedReason::RoleNotPermitted(Role::Agent))
    );

    session.shutdown().await;
}

#[tokio::test]
async fn transient_denial_keeps_session() {
    let identity = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_token(&identity, "client@acme.com", "token-7").await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&identity)
        .await;
    mount_access(&portal, "client@acme.com", ResponseTemplate::new(503)).await;

    let session = session(&identity, &portal);
    session.login("client@acme.com", "secret").await.unwrap();

    let state = tokio::time::timeout(
        WAIT,
        session.wait_for(|s| matches!(s, GateState::Denied(_))),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(state, GateState::Denied(DeniedReason::TryAgain(_))));
    assert_eq!(session.access_token().await.as_deref(), Some("token-7"));
    assert!(session.last_denial().await.is_none());

    session.shutdown().await;
}

#[tokio::test]
async fn logout_clears_session_even_when_provider_fails() {
    let identity = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_token(&identity, "client@acme.com", "token-7").await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&identity)
        .await;
    mount_access(
        &portal,
        "client@acme.com",
        ResponseTemplate::new(200).set_body_json(granted_body("client@acme.com")),
    )
    .await;

    let session = session(&identity, &portal);
    session.login("client@acme.com", "secret").await.unwrap();
    tokio::time::timeout(WAIT, session.wait_for(GateState::is_authorized))
        .await
        .unwrap()
        .unwrap();

    session.logout().await;
    tokio::time::timeout(
        WAIT,
        session.wait_for(|s| matches!(s, GateState::Unauthenticated)),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(session.access_token().await.is_none());

    session.shutdown().await;
}

#[tokio::test]
async fn bad_credentials_leave_gate_unauthenticated() {
    let identity = MockServer::start().await;
    let portal = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&identity)
        .await;

    let session = session(&identity, &portal);
    let err = session.login("client@acme.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated(_)));

    let state = tokio::time::timeout(WAIT, session.wait_for(|s| !s.is_loading()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state, GateState::Unauthenticated);

    session.shutdown().await;
}
