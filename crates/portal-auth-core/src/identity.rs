//! Identity session sources
//!
//! An [`IdentitySource`] reports the current provider session and delivers
//! session-change notifications in order to every subscriber.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use portal_types::{ExternalIdentity, SessionChange};
use tokio::sync::{mpsc, watch};

use crate::error::AuthError;

/// Source of provider session state
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// The persisted session, if any
    async fn current_session(&self) -> Result<Option<ExternalIdentity>, AuthError>;

    /// Receive every change published after this call, in order
    fn subscribe(&self) -> Subscription;
}

/// Ordered stream of session changes; unsubscribes when dropped
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SessionChange>,
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<SessionChange>,
        unsubscribe: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Next change, or `None` once the source is gone
    pub async fn recv(&mut self) -> Option<SessionChange> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

type Subscribers = DashMap<u64, mpsc::UnboundedSender<SessionChange>>;

/// In-process identity source.
///
/// Holds the current session and fans changes out to subscribers. Publishing
/// is serialized so all subscribers observe the same order.
pub struct ChannelIdentitySource {
    session: watch::Sender<Option<ExternalIdentity>>,
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl Default for ChannelIdentitySource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChannelIdentitySource {
    /// Create a source, optionally with a persisted session
    pub fn new(session: Option<ExternalIdentity>) -> Self {
        let (session, _) = watch::channel(session);
        Self {
            session,
            subscribers: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn sign_in(&self, identity: ExternalIdentity) {
        self.publish(SessionChange::signed_in(identity));
    }

    pub fn refresh(&self, identity: ExternalIdentity) {
        self.publish(SessionChange::refreshed(identity));
    }

    pub fn sign_out(&self) {
        self.publish(SessionChange::signed_out());
    }

    /// Current session without awaiting
    pub fn session(&self) -> Option<ExternalIdentity> {
        self.session.borrow().clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&self, change: SessionChange) {
        tracing::debug!(event = ?change.event, "publishing session change");
        self.session.send_modify(|session| {
            session.clone_from(&change.identity);
            self.subscribers
                .retain(|_, tx| tx.send(change.clone()).is_ok());
        });
    }
}

#[async_trait]
impl IdentitySource for ChannelIdentitySource {
    async fn current_session(&self) -> Result<Option<ExternalIdentity>, AuthError> {
        Ok(self.session())
    }

    fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);

        let subscribers = Arc::downgrade(&self.subscribers);
        Subscription::new(rx, move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.remove(&id);
            }
        })
    }
}
