//! Portal Auth Core - Access decisions for the client portal
//!
//! Maps an identity issued by the external identity provider onto the
//! internal user directory and decides whether the holder may use the
//! portal:
//! - [`RoleResolver`]: email lookup, role check and organization attachment
//! - [`ResolutionCache`]: single-flight cache of positive resolutions
//! - [`SessionGate`]: state machine driven by session-change events
//! - [`IdentityProvider`] / [`IdentitySource`]: the provider seams

pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod provider;
pub mod resolver;

pub use cache::ResolutionCache;
pub use config::{CacheConfig, GateConfig, ProviderConfig};
pub use error::{AuthError, ResolveError};
pub use gate::{DeniedReason, GateHandle, GateState, GateView, SessionGate};
pub use identity::{ChannelIdentitySource, IdentitySource, Subscription};
pub use provider::{HttpIdentityProvider, IdentityProvider, ProviderSession};
pub use resolver::{normalize_email, CachedResolver, DirectoryResolver, RoleResolver};
