//! Common test utilities for portal-auth-core integration tests

pub mod fixtures;
pub mod mock_resolver;

#[allow(unused_imports)]
pub use fixtures::{acme_directory, cached_resolver};
#[allow(unused_imports)]
pub use mock_resolver::ScriptedResolver;
