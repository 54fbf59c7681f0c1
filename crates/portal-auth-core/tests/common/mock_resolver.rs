//! Scripted role resolver for gate tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use portal_auth_core::{ResolveError, RoleResolver};
use portal_types::{Denial, ResolutionResult};

/// Resolver answering from a script; unknown emails are `NotFound`
#[derive(Default, Clone)]
pub struct ScriptedResolver {
    answers: Arc<DashMap<String, Result<ResolutionResult, ResolveError>>>,
    delays: Arc<DashMap<String, Duration>>,
    panics: Arc<DashSet<String>>,
    calls_by_email: Arc<DashMap<String, usize>>,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, email: &str, answer: Result<ResolutionResult, ResolveError>) {
        self.answers.insert(email.to_string(), answer);
    }

    /// Hold lookups for `email` before answering
    pub fn delay(&self, email: &str, delay: Duration) {
        self.delays.insert(email.to_string(), delay);
    }

    /// Make lookups for `email` panic
    pub fn panic_on(&self, email: &str) {
        self.panics.insert(email.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, email: &str) -> usize {
        self.calls_by_email.get(email).map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl RoleResolver for ScriptedResolver {
    async fn resolve(
        &self,
        _external_id: &str,
        email: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_email.entry(email.to_string()).or_insert(0) += 1;

        let delay = self.delays.get(email).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics.contains(email) {
            panic!("scripted panic for {email}");
        }

        self.answers
            .get(email)
            .map(|answer| answer.value().clone())
            .unwrap_or(Ok(ResolutionResult::Denied(Denial::NotFound)))
    }
}
