//! Role resolution against a seeded directory

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{acme_directory, cached_resolver};
use portal_auth_core::{DirectoryResolver, ResolveError, RoleResolver};
use portal_types::{Denial, MemberId, ResolutionResult, Role, UserId};

fn resolver(dir: &portal_db::MemoryDirectory) -> impl RoleResolver {
    let dir = Arc::new(dir.clone());
    DirectoryResolver::new(Arc::clone(&dir), dir)
}

#[tokio::test]
async fn client_resolves_with_organization() {
    let dir = acme_directory();
    let result = resolver(&dir)
        .resolve("ext-123", "client@acme.com")
        .await
        .unwrap();

    assert!(result.is_valid());
    let user = result.user().unwrap();
    assert_eq!(user.id, UserId(7));
    assert_eq!(user.role, Role::Client);
    let org = result.organization().unwrap();
    assert_eq!(org.id, MemberId(3));
    assert_eq!(org.name, "Acme");
}

#[tokio::test]
async fn agent_is_not_permitted() {
    let dir = acme_directory();
    let result = resolver(&dir).resolve("", "agent@acme.com").await.unwrap();

    assert_eq!(
        result,
        ResolutionResult::Denied(Denial::RoleNotPermitted(Role::Agent))
    );
    assert_eq!(result.error_reason(), Some("role not permitted"));
}

#[tokio::test]
async fn internal_staff_is_not_permitted() {
    let dir = acme_directory();
    let result = resolver(&dir).resolve("", "staff@acme.com").await.unwrap();
    assert_eq!(result.error_reason(), Some("role not permitted"));
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let dir = acme_directory();
    let result = resolver(&dir).resolve("", "ghost@acme.com").await.unwrap();

    assert!(!result.is_valid());
    assert_eq!(result.error_reason(), Some("user not found"));
}

#[tokio::test]
async fn client_without_membership_has_no_organization() {
    let dir = acme_directory();
    dir.insert_user(20, "loner@acme.com", Role::Client);

    let result = resolver(&dir).resolve("", "loner@acme.com").await.unwrap();
    assert!(result.is_valid());
    assert!(result.organization().is_none());
}

#[tokio::test]
async fn email_is_trimmed_but_required() {
    let dir = acme_directory();
    let resolver = resolver(&dir);

    let result = resolver.resolve("", "  client@acme.com ").await.unwrap();
    assert!(result.is_valid());

    let err = resolver.resolve("ext-123", "   ").await.unwrap_err();
    assert_eq!(err, ResolveError::MissingEmail);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn unknown_role_is_malformed() {
    let dir = acme_directory();
    dir.insert_raw_user(21, "odd@acme.com", "Contractor");

    let err = resolver(&dir).resolve("", "odd@acme.com").await.unwrap_err();
    assert!(matches!(err, ResolveError::Malformed(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_directory_is_transient() {
    let dir = acme_directory();
    dir.set_unavailable(true);

    let err = resolver(&dir).resolve("", "client@acme.com").await.unwrap_err();
    assert!(matches!(err, ResolveError::Unavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn denials_are_never_cached() {
    let dir = acme_directory();
    let resolver = cached_resolver(&dir, Duration::from_secs(10));

    for _ in 0..3 {
        let result = resolver.resolve("", "ghost@acme.com").await.unwrap();
        assert_eq!(result.error_reason(), Some("user not found"));
    }
    for _ in 0..3 {
        let result = resolver.resolve("", "agent@acme.com").await.unwrap();
        assert_eq!(result.error_reason(), Some("role not permitted"));
    }

    assert_eq!(dir.email_lookups(), 6);
    assert!(resolver.cache().get("ghost@acme.com").await.is_none());
    assert!(resolver.cache().get("agent@acme.com").await.is_none());
}

#[tokio::test]
async fn second_resolve_is_served_from_cache() {
    let dir = acme_directory();
    let resolver = cached_resolver(&dir, Duration::from_secs(10));

    let first = resolver.resolve("", "client@acme.com").await.unwrap();
    let second = resolver.resolve("", "client@acme.com").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(dir.email_lookups(), 1);
}

#[tokio::test]
async fn cached_result_survives_directory_outage() {
    let dir = acme_directory();
    let resolver = cached_resolver(&dir, Duration::from_secs(10));

    resolver.resolve("", "client@acme.com").await.unwrap();
    dir.set_unavailable(true);

    let result = resolver.resolve("", "client@acme.com").await.unwrap();
    assert!(result.is_valid());
}

#[tokio::test]
async fn transient_failure_is_retried_on_next_call() {
    let dir = acme_directory();
    let resolver = cached_resolver(&dir, Duration::from_secs(10));

    dir.set_unavailable(true);
    assert!(resolver.resolve("", "client@acme.com").await.is_err());

    dir.set_unavailable(false);
    assert!(resolver.resolve("", "client@acme.com").await.unwrap().is_valid());
    assert_eq!(dir.email_lookups(), 2);
}
