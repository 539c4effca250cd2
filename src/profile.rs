// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-gated profile fetch and cache.
//!
//! A profile only exists for sessions whose primary role is a real role
//! (not `NONE`). Fetches are keyed by the token and the session generation
//! they were issued under; a response that resolves after the session
//! changed, or after the stored token was replaced behind the store's back,
//! is dropped.

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{ProfileApi, ProfileRecord};
use crate::auth::{claims, AuthStateStore, Role};
use crate::error::{Result, SessionError};

/// Server profile merged with the role set from the token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub record: ProfileRecord,
    pub roles: Vec<String>,
}

impl UserProfile {
    pub fn merge(record: ProfileRecord, roles: Vec<String>) -> Self {
        Self { record, roles }
    }

    pub fn primary_role(&self) -> Role {
        Role::primary(&self.roles)
    }
}

/// Observable profile state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Why `fetch_profile` did not contact the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoToken,
    Undecodable,
    /// Token is past its expiry. It stays in storage.
    Expired,
    NotEligible,
}

/// Result of a `fetch_profile` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded,
    Skipped(SkipReason),
    /// A request for the same session is already outstanding.
    AlreadyInFlight,
    /// The session changed while the request was outstanding.
    Discarded,
}

struct InFlight {
    token: String,
    generation: u64,
}

impl InFlight {
    fn is(&self, token: &str, generation: u64) -> bool {
        self.token == token && self.generation == generation
    }
}

struct Inner {
    state: ProfileState,
    /// Session generation and token the cached state belongs to
    generation: u64,
    token: Option<String>,
    in_flight: Option<InFlight>,
}

impl Inner {
    /// Remove the marker for (token, generation) if it is still ours.
    fn finish(&mut self, token: &str, generation: u64) {
        if self.in_flight.as_ref().is_some_and(|f| f.is(token, generation)) {
            self.in_flight = None;
        }
        if self.in_flight.is_none() {
            self.state.is_loading = false;
        }
    }
}

/// Clears the in-flight marker if the fetch future is dropped before the
/// response arrives.
struct InFlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    token: String,
    generation: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn finish(mut self, inner: &mut Inner) {
        inner.finish(&self.token, self.generation);
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(generation = self.generation, "Profile fetch cancelled");
            lock_inner(self.inner).finish(&self.token, self.generation);
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Profile cache for the current session.
pub struct ProfileStore<A> {
    auth: Arc<AuthStateStore>,
    api: A,
    inner: Mutex<Inner>,
}

impl<A: ProfileApi> ProfileStore<A> {
    pub fn new(auth: Arc<AuthStateStore>, api: A) -> Self {
        let generation = auth.generation();
        let token = auth.token();
        Self {
            auth,
            api,
            inner: Mutex::new(Inner {
                state: ProfileState::default(),
                generation,
                token,
                in_flight: None,
            }),
        }
    }

    /// Fetch the profile for the current session if it is eligible.
    ///
    /// Returns `Err(AuthorizationRejection)` after the server refused the
    /// session (token and profile are cleared), and `Err(TransientFetch)` for
    /// any other failure (session kept, message stored). Retrying is up to
    /// the caller.
    pub async fn fetch_profile(&self) -> Result<FetchOutcome> {
        let Some(token) = self.auth.token() else {
            self.clear_profile();
            return Ok(FetchOutcome::Skipped(SkipReason::NoToken));
        };

        let claims = match claims::decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable session token");
                self.auth.discard_token();
                self.clear_profile();
                return Ok(FetchOutcome::Skipped(SkipReason::Undecodable));
            }
        };

        if claims.is_expired_at(Utc::now()) {
            tracing::debug!(subject = %claims.sub, "Profile fetch skipped, session expired");
            self.clear_profile();
            return Ok(FetchOutcome::Skipped(SkipReason::Expired));
        }

        if Role::primary(&claims.roles) == Role::None {
            tracing::debug!(subject = %claims.sub, "Profile fetch skipped, KYC incomplete");
            self.clear_profile();
            return Ok(FetchOutcome::Skipped(SkipReason::NotEligible));
        }

        let generation = self.auth.generation();
        {
            let mut inner = self.lock();
            self.reconcile(&mut inner);
            let duplicate = inner.in_flight.as_ref().is_some_and(|f| f.is(&token, generation));
            if duplicate {
                return Ok(FetchOutcome::AlreadyInFlight);
            }
            inner.in_flight = Some(InFlight {
                token: token.clone(),
                generation,
            });
            inner.state.is_loading = true;
            inner.state.error = None;
        }
        let guard = InFlightGuard {
            inner: &self.inner,
            token: token.clone(),
            generation,
            armed: true,
        };

        tracing::debug!(subject = %claims.sub, generation, "Fetching profile");
        let result = self.api.fetch_profile(&token).await;

        let mut inner = self.lock();
        guard.finish(&mut inner);

        let changed = self.auth.generation() != generation
            || self.auth.token().as_deref() != Some(token.as_str());
        if changed {
            tracing::debug!(generation, "Dropping profile response for a previous session");
            return Ok(FetchOutcome::Discarded);
        }

        inner.state.is_loading = false;
        inner.generation = generation;
        inner.token = Some(token);

        match result {
            Ok(record) => {
                inner.state.profile = Some(UserProfile::merge(record, claims.roles));
                inner.state.error = None;
                tracing::info!(subject = %claims.sub, "Profile loaded");
                Ok(FetchOutcome::Loaded)
            }
            Err(e) if e.is_authorization_failure() => {
                inner.state = ProfileState::default();
                drop(inner);
                self.auth.invalidate();
                Err(SessionError::AuthorizationRejection)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed");
                let message = e.to_string();
                inner.state.profile = None;
                inner.state.error = Some(message.clone());
                Err(SessionError::TransientFetch(message))
            }
        }
    }

    /// Reset to the empty state.
    pub fn clear_profile(&self) {
        let mut inner = self.lock();
        inner.state.profile = None;
        inner.state.error = None;
        inner.generation = self.auth.generation();
        inner.token = self.auth.token();
        if inner.in_flight.is_none() {
            inner.state.is_loading = false;
        }
    }

    pub fn state(&self) -> ProfileState {
        let mut inner = self.lock();
        self.reconcile(&mut inner);
        inner.state.clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state().profile
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error
    }

    /// Keep the profile in step with the session: fetch when it becomes
    /// eligible, clear when it stops being eligible.
    ///
    /// Only a weak reference is held between changes, so the loop ends once
    /// every other handle to the store is dropped (checked on the next
    /// change) or the auth store itself goes away. Fetch errors are already
    /// reflected in the stored state and are not retried here.
    pub async fn follow_session(self: Arc<Self>) {
        let mut rx = self.auth.subscribe();
        let this = Arc::downgrade(&self);
        drop(self);

        loop {
            let Some(store) = this.upgrade() else {
                break;
            };
            let eligible = rx.borrow_and_update().is_profile_eligible();
            if eligible {
                if let Err(e) = store.fetch_profile().await {
                    tracing::debug!(error = %e, "Profile fetch after session change failed");
                }
            } else {
                store.clear_profile();
            }
            drop(store);

            if rx.changed().await.is_err() {
                break;
            }
        }
        tracing::debug!("Session follower stopped");
    }

    /// Drop cached state that belongs to another session or to a session
    /// that is no longer eligible.
    fn reconcile(&self, inner: &mut Inner) {
        let current = self.auth.generation();
        let token = self.auth.token();
        let stale = inner.generation != current
            || inner.token != token
            || (inner.state.profile.is_some() && !self.auth.snapshot().is_profile_eligible());
        if !stale {
            return;
        }

        let pending = match (&inner.in_flight, &token) {
            (Some(f), Some(t)) => f.is(t, current),
            _ => false,
        };
        inner.state.profile = None;
        inner.state.error = None;
        inner.generation = current;
        inner.token = token;
        if !pending {
            inner.state.is_loading = false;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }
}
