//! Application state

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use portal_auth_core::{
    DirectoryResolver, GateConfig, IdentityProvider, ResolveError, RoleResolver,
};
use portal_db::{
    AttendanceRepository, BreakRepository, DbPool, EmployeeRepository, MemberRepository,
    Repositories, UserRepository,
};
use portal_types::ResolutionResult;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Repositories behind trait objects
#[derive(Clone)]
pub struct Directory {
    pub users: Arc<dyn UserRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub breaks: Arc<dyn BreakRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
}

impl Directory {
    /// Directory backed by PostgreSQL
    pub fn from_repositories(repos: Repositories) -> Self {
        Self {
            users: Arc::new(repos.users),
            members: Arc::new(repos.members),
            employees: Arc::new(repos.employees),
            breaks: Arc::new(repos.breaks),
            attendance: Arc::new(repos.attendance),
        }
    }

    /// Directory where one store serves every repository
    pub fn shared<D>(store: Arc<D>) -> Self
    where
        D: UserRepository
            + MemberRepository
            + EmployeeRepository
            + BreakRepository
            + AttendanceRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            members: store.clone(),
            employees: store.clone(),
            breaks: store.clone(),
            attendance: store,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Directory,
    /// Role resolution against the directory
    pub resolver: Arc<dyn RoleResolver>,
    /// Identity provider used to validate bearer tokens
    pub provider: Arc<dyn IdentityProvider>,
    /// Database pool, absent when running on another store
    pub pool: Option<SharedPool>,
    pub request_timeout: Duration,
    pub lookup_timeout: Duration,
}

impl AppState {
    pub fn new(directory: Directory, provider: Arc<dyn IdentityProvider>) -> Self {
        let resolver = Arc::new(DirectoryResolver::new(
            Arc::clone(&directory.users),
            Arc::clone(&directory.members),
        ));
        Self {
            directory,
            resolver,
            provider,
            pool: None,
            request_timeout: Duration::from_secs(30),
            lookup_timeout: GateConfig::default().lookup_timeout,
        }
    }

    #[must_use]
    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(SharedPool(Arc::new(pool)));
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Resolve an identity, bounded by the lookup timeout
    pub async fn resolve(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        tokio::time::timeout(
            self.lookup_timeout,
            self.resolver.resolve(external_id, email),
        )
        .await
        .map_err(|_| ResolveError::Timeout(self.lookup_timeout))?
    }
}
