//! Desktop session facade
//!
//! Ties the identity provider, an in-process identity source and a running
//! [`SessionGate`] together. The UI calls [`PortalSession::login`] and
//! [`PortalSession::logout`] and renders [`PortalSession::view`].

use std::sync::Arc;

use portal_auth_core::{
    CachedResolver, ChannelIdentitySource, DeniedReason, GateHandle, GateState, GateView,
    IdentityProvider, ProviderSession, RoleResolver, SessionGate,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::ClientError;

struct Inner {
    source: Arc<ChannelIdentitySource>,
    provider: Arc<dyn IdentityProvider>,
    session: Mutex<Option<ProviderSession>>,
    denial: Mutex<Option<DeniedReason>>,
}

impl Inner {
    /// Drop a refused session at the provider and locally
    async fn reject(&self, reason: DeniedReason) {
        warn!(reason = ?reason, "access refused, signing out");
        *self.denial.lock().await = Some(reason);

        if let Some(session) = self.session.lock().await.take() {
            if let Err(err) = self.provider.sign_out(&session.access_token).await {
                warn!(error = %err, "provider sign-out failed");
            }
        }
        self.source.sign_out();
    }
}

/// Signed-in state of the desktop client
pub struct PortalSession {
    inner: Arc<Inner>,
    gate: GateHandle,
    watcher: JoinHandle<()>,
}

impl PortalSession {
    /// Start a gate, optionally resuming a persisted provider session
    pub fn start<R>(
        provider: Arc<dyn IdentityProvider>,
        resolver: Arc<CachedResolver<R>>,
        restored: Option<ProviderSession>,
    ) -> Self
    where
        R: RoleResolver + ?Sized + 'static,
    {
        let source = Arc::new(ChannelIdentitySource::new(
            restored.as_ref().map(|session| session.identity.clone()),
        ));
        let gate = SessionGate::spawn(Arc::clone(&source), resolver);

        let inner = Arc::new(Inner {
            source,
            provider,
            session: Mutex::new(restored),
            denial: Mutex::new(None),
        });
        let watcher = tokio::spawn(watch_denials(Arc::clone(&inner), gate.subscribe()));

        Self {
            inner,
            gate,
            watcher,
        }
    }

    /// Sign in with email and password.
    ///
    /// Returns once the provider accepted the credentials; the access decision
    /// follows asynchronously through the gate.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let session = self
            .inner
            .provider
            .sign_in_with_password(email, password)
            .await?;
        let identity = session.identity.clone();

        *self.inner.session.lock().await = Some(session);
        *self.inner.denial.lock().await = None;
        info!(email = %identity.email, "signed in");
        self.inner.source.sign_in(identity);
        Ok(())
    }

    /// Sign out. Local state is always cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let session = self.inner.session.lock().await.take();
        match session {
            Some(session) if session.identity.is_expired() => {
                debug!("session already expired, clearing local state only");
            }
            Some(session) => {
                if let Err(err) = self.inner.provider.sign_out(&session.access_token).await {
                    warn!(error = %err, "provider sign-out failed");
                }
            }
            None => debug!("no session to sign out"),
        }
        self.inner.source.sign_out();
    }

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    pub fn view(&self) -> GateView {
        self.gate.view()
    }

    /// Receiver that observes every gate state change
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.gate.subscribe()
    }

    /// Wait until the gate state satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&GateState) -> bool,
    ) -> Option<GateState> {
        let mut states = self.gate.subscribe();
        states
            .wait_for(predicate)
            .await
            .ok()
            .map(|state| state.clone())
    }

    /// Access token of the current session
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    /// Why the last sign-in was refused, if it was
    pub async fn last_denial(&self) -> Option<DeniedReason> {
        self.inner.denial.lock().await.clone()
    }

    /// Stop the gate and release its subscription
    pub async fn shutdown(self) {
        self.watcher.abort();
        self.gate.shutdown().await;
    }
}

async fn watch_denials(inner: Arc<Inner>, mut states: watch::Receiver<GateState>) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        if let GateState::Denied(reason) = state {
            // Transient failures keep the session so a later event can retry.
            if !reason.is_retryable() {
                inner.reject(reason).await;
            }
        }
    }
}
