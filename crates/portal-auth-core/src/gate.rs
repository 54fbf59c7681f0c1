//! Session gate
//!
//! Runs as a background task that follows an [`IdentitySource`] and keeps a
//! single access decision for the current identity. Observers read the
//! decision through a `watch` channel.
//!
//! ```text
//! Initializing <─> Unauthenticated <──────────── sign-out / expiry
//!      │                 │ sign-in (via Initializing)
//!      └───────────> Resolving ──> Authorized
//!                        └───────> Denied
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use portal_types::{
    Denial, ExternalIdentity, InternalUser, Organization, Resolution, ResolutionResult, Role,
    SessionChange, SessionEvent,
};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::ResolveError;
use crate::identity::IdentitySource;
use crate::resolver::{normalize_email, CachedResolver, RoleResolver};

/// Why the current identity was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedReason {
    /// No internal account for the email
    NotProvisioned,
    /// Account exists but its role may not use the portal
    RoleNotPermitted(Role),
    /// The directory could not be consulted; a later session event retries
    TryAgain(String),
    /// The identity carried no usable email
    InvalidIdentity,
}

impl DeniedReason {
    /// Message shown to the person signing in
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotProvisioned => Denial::NotFound.message(),
            Self::RoleNotPermitted(role) => Denial::RoleNotPermitted(*role).message(),
            Self::TryAgain(_) => {
                "We couldn't verify your account right now. Please try again later."
            }
            Self::InvalidIdentity => "Your sign-in did not include an email address.",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TryAgain(_))
    }
}

impl From<Denial> for DeniedReason {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound => Self::NotProvisioned,
            Denial::RoleNotPermitted(role) => Self::RoleNotPermitted(role),
        }
    }
}

/// Access decision for the current identity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// Waiting for the first session read
    #[default]
    Initializing,
    Unauthenticated,
    Resolving {
        email: String,
    },
    Authorized(Resolution),
    Denied(DeniedReason),
}

impl GateState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving { .. } => "resolving",
            Self::Authorized(_) => "authorized",
            Self::Denied(_) => "denied",
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    /// Still waiting for a decision
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing | Self::Resolving { .. })
    }

    pub fn view(&self) -> GateView {
        let (user, organization) = match self {
            Self::Authorized(resolution) => {
                (Some(resolution.user.clone()), resolution.organization.clone())
            }
            _ => (None, None),
        };
        GateView {
            authorized: self.is_authorized(),
            loading: self.is_loading(),
            denied_reason: match self {
                Self::Denied(reason) => Some(reason.message().to_string()),
                _ => None,
            },
            user,
            organization,
        }
    }
}

/// What the UI needs from the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateView {
    pub authorized: bool,
    pub loading: bool,
    pub denied_reason: Option<String>,
    pub user: Option<InternalUser>,
    pub organization: Option<Organization>,
}

type Completion = (String, Result<ResolutionResult, ResolveError>);

/// Event loop state behind a [`GateHandle`]
pub struct SessionGate<R: RoleResolver + ?Sized + 'static> {
    resolver: Arc<CachedResolver<R>>,
    state: watch::Sender<GateState>,
    current: watch::Sender<Option<String>>,
    identity: Option<ExternalIdentity>,
    expires_at: Option<Instant>,
    in_flight: HashSet<String>,
    /// Emails signed out while their lookup was running. Whatever those
    /// lookups produce is dropped from the cache and never applied.
    revoked: HashSet<String>,
    tasks: HashMap<task::Id, String>,
    pending: JoinSet<Completion>,
}

impl<R: RoleResolver + ?Sized + 'static> SessionGate<R> {
    /// Start a gate following `source`.
    ///
    /// The gate runs until [`GateHandle::shutdown`] is called, the handle is
    /// dropped, or the source goes away.
    pub fn spawn<S>(source: Arc<S>, resolver: Arc<CachedResolver<R>>) -> GateHandle
    where
        S: IdentitySource + ?Sized + 'static,
    {
        let (state_tx, state_rx) = watch::channel(GateState::Initializing);
        let (current, _) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let gate = Self {
            resolver,
            state: state_tx,
            current,
            identity: None,
            expires_at: None,
            in_flight: HashSet::new(),
            revoked: HashSet::new(),
            tasks: HashMap::new(),
            pending: JoinSet::new(),
        };
        let task = tokio::spawn(gate.run(source, shutdown_rx));

        GateHandle {
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run<S>(mut self, source: Arc<S>, mut shutdown: oneshot::Receiver<()>)
    where
        S: IdentitySource + ?Sized,
    {
        // Subscribe before the first read so nothing published in between is lost.
        let mut subscription = source.subscribe();
        let initial = source.current_session().await.unwrap_or_else(|err| {
            warn!(error = %err, "failed to read persisted session");
            None
        });
        self.apply(SessionChange::initial(initial)).await;

        loop {
            let expiry = self.expires_at;
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!("session gate shutting down");
                    break;
                }
                change = subscription.recv() => match change {
                    Some(change) => self.apply(change).await,
                    None => {
                        debug!("identity source closed");
                        break;
                    }
                },
                Some(joined) = self.pending.join_next_with_id(), if !self.pending.is_empty() => {
                    self.complete(joined).await;
                }
                _ = tokio::time::sleep_until(expiry.unwrap_or_else(Instant::now)), if expiry.is_some() => {
                    warn!("session expired");
                    self.sign_out().await;
                }
            }
        }

        self.pending.abort_all();
    }

    fn current_email(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn transition(&self, next: GateState) {
        metrics::counter!("portal_gate_transitions", "state" => next.name()).increment(1);
        info!(state = next.name(), "gate transition");
        self.state.send_replace(next);
    }

    async fn apply(&mut self, change: SessionChange) {
        debug!(event = ?change.event, "session change");
        match change.identity {
            Some(identity) if change.event != SessionEvent::SignedOut => {
                if change.event == SessionEvent::SignedIn
                    && matches!(*self.state.borrow(), GateState::Unauthenticated)
                {
                    self.transition(GateState::Initializing);
                }
                if identity.is_expired() {
                    warn!(email = %identity.email, "session already expired");
                    self.sign_out().await;
                } else {
                    self.authenticate(identity).await;
                }
            }
            _ => self.sign_out().await,
        }
    }

    async fn forget_current(&mut self) {
        if let Some(email) = self.current.send_replace(None) {
            self.resolver.cache().invalidate(&email).await;
            if self.in_flight.contains(&email) {
                self.revoked.insert(email.clone());
            }
            debug!(%email, "resolution invalidated");
        }
        self.identity = None;
        self.expires_at = None;
    }

    async fn sign_out(&mut self) {
        self.forget_current().await;
        self.transition(GateState::Unauthenticated);
    }

    async fn authenticate(&mut self, identity: ExternalIdentity) {
        let email = match normalize_email(&identity.email) {
            Ok(email) => email.to_string(),
            Err(_) => {
                warn!(external_id = %identity.id, "identity without email");
                self.forget_current().await;
                self.transition(GateState::Denied(DeniedReason::InvalidIdentity));
                return;
            }
        };

        if self.current_email().is_some_and(|previous| previous != email) {
            self.forget_current().await;
        }
        self.expires_at = identity.expires_at.map(deadline);
        self.current.send_replace(Some(email.clone()));
        let external_id = identity.id.clone();
        self.identity = Some(identity);

        if !self.revoked.contains(&email) {
            if let Some(resolution) = self.resolver.cache().get(&email).await {
                debug!(%email, "resolution cache hit");
                metrics::counter!("portal_resolution_cache_hits").increment(1);
                self.transition(GateState::Authorized(resolution));
                return;
            }
        }

        self.transition(GateState::Resolving {
            email: email.clone(),
        });
        self.start_resolution(external_id, email);
    }

    fn start_resolution(&mut self, external_id: String, email: String) {
        if !self.in_flight.insert(email.clone()) {
            debug!(%email, "resolution already in flight");
            return;
        }

        let resolver = Arc::clone(&self.resolver);
        let current = self.current.subscribe();
        let key = email.clone();
        let handle = self.pending.spawn(async move {
            let result = resolver
                .resolve_for(&external_id, &key, move |candidate| {
                    current.borrow().as_deref() == Some(candidate)
                })
                .await;
            (key, result)
        });
        self.tasks.insert(handle.id(), email);
    }

    fn current_external_id(&self) -> String {
        self.identity
            .as_ref()
            .map(|identity| identity.id.clone())
            .unwrap_or_default()
    }

    /// Clear the bookkeeping for a finished lookup. Returns whether the
    /// email was signed out while it ran.
    async fn finish(&mut self, id: task::Id, email: &str) -> bool {
        self.tasks.remove(&id);
        self.in_flight.remove(email);
        if !self.revoked.remove(email) {
            return false;
        }
        // The lookup may have committed after the sign-out invalidated it.
        self.resolver.cache().invalidate(email).await;
        true
    }

    async fn complete(&mut self, joined: Result<(task::Id, Completion), JoinError>) {
        let (id, (email, result)) = match joined {
            Ok(joined) => joined,
            Err(err) => {
                error!(error = %err, "resolution task failed");
                let Some(email) = self.tasks.get(&err.id()).cloned() else {
                    return;
                };
                self.finish(err.id(), &email).await;
                if self.current_email().as_deref() == Some(email.as_str())
                    && matches!(*self.state.borrow(), GateState::Resolving { .. })
                {
                    self.resolver.cache().invalidate(&email).await;
                    self.transition(GateState::Denied(DeniedReason::TryAgain(err.to_string())));
                }
                return;
            }
        };
        let revoked = self.finish(id, &email).await;
        let is_current = self.current_email().as_deref() == Some(email.as_str());

        if !is_current {
            debug!(%email, "discarding stale resolution");
            return;
        }
        if revoked {
            debug!(%email, "signed out during lookup, resolving again");
            let external_id = self.current_external_id();
            self.start_resolution(external_id, email);
            return;
        }

        match result {
            Ok(ResolutionResult::Granted(resolution)) => {
                self.transition(GateState::Authorized(resolution));
            }
            Ok(ResolutionResult::Denied(denial)) => {
                warn!(%email, reason = %denial, "access denied");
                self.transition(GateState::Denied(denial.into()));
            }
            Err(ResolveError::StaleIdentity(_)) => {
                // Identity switched away and back while the lookup ran.
                debug!(%email, "resolution superseded, resolving again");
                let external_id = self.current_external_id();
                self.start_resolution(external_id, email);
            }
            Err(err) => {
                warn!(%email, error = %err, "resolution failed");
                self.transition(GateState::Denied(DeniedReason::TryAgain(err.to_string())));
            }
        }
    }
}

fn deadline(expires_at: DateTime<Utc>) -> Instant {
    let remaining = (expires_at - Utc::now()).to_std().unwrap_or_default();
    Instant::now() + remaining
}

/// Handle to a running [`SessionGate`]
pub struct GateHandle {
    state: watch::Receiver<GateState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl GateHandle {
    /// Current state
    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> GateView {
        self.state.borrow().view()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }

    /// Wait until the state satisfies `predicate`; `None` once the gate stopped
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&GateState) -> bool,
    ) -> Option<GateState> {
        self.state
            .wait_for(predicate)
            .await
            .ok()
            .map(|state| state.clone())
    }

    /// Stop the gate and wait for its task to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(err) = self.task.await {
            error!(error = %err, "session gate task failed");
        }
    }
}
