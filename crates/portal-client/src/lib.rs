//! Portal Client - SDK for portal consumers
//!
//! HTTP client for the portal API, a [`RoleResolver`](portal_auth_core::RoleResolver)
//! that delegates to it, and the desktop session facade that ties the
//! identity provider, the session gate and the portal together.

pub mod api;
pub mod config;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod session;

pub use api::{AccessGrant, AttendanceQuery, AttendanceReport, PortalClient};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::ClientError;
pub use resolver::HttpRoleResolver;
pub use retry::{with_retry, RetryConfig, RetryPolicy, RetryableError};
pub use session::PortalSession;
