//! Portal DB - Database abstractions
//!
//! SQLx-based database layer for the client portal.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/portal").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("client@acme.com").await?;
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
#[cfg(feature = "memory")]
pub use memory::MemoryDirectory;
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;
