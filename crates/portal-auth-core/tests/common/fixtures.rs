//! Seeded directories and resolver stacks

use std::sync::Arc;
use std::time::Duration;

use portal_auth_core::{
    CacheConfig, CachedResolver, DirectoryResolver, GateConfig, ResolutionCache,
};
use portal_db::MemoryDirectory;
use portal_types::Role;

pub type MemoryResolver = DirectoryResolver<MemoryDirectory, MemoryDirectory>;

/// Acme (member 3) with one client, one agent and one internal user;
/// Globex (member 4) with one client.
pub fn acme_directory() -> MemoryDirectory {
    let dir = MemoryDirectory::new();
    dir.insert_member(3, "Acme");
    dir.insert_member(4, "Globex");

    let client = dir.insert_user(7, "client@acme.com", Role::Client);
    dir.add_client(client, 3);

    let agent = dir.insert_user(8, "agent@acme.com", Role::Agent);
    dir.add_agent(agent, 3, Some("Support"));

    dir.insert_user(9, "staff@acme.com", Role::Internal);

    let other = dir.insert_user(10, "client@globex.com", Role::Client);
    dir.add_client(other, 4);

    dir
}

/// Directory resolver behind a fresh cache
#[allow(dead_code)]
pub fn cached_resolver(
    dir: &MemoryDirectory,
    lookup_timeout: Duration,
) -> Arc<CachedResolver<MemoryResolver>> {
    let directory = Arc::new(dir.clone());
    let inner = Arc::new(DirectoryResolver::new(
        Arc::clone(&directory),
        directory,
    ));
    Arc::new(CachedResolver::new(
        inner,
        ResolutionCache::new(CacheConfig::default()),
        &GateConfig::new().with_lookup_timeout(lookup_timeout),
    ))
}
