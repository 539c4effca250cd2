// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived session state and the store that owns it.
//!
//! The store is an owned object handed to whoever needs it (guards, profile
//! store, UI) rather than a global. Every token mutation bumps the session
//! generation and publishes a fresh [`AuthState`] on a `watch` channel.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use super::claims::{self, Claims};
use super::role::Role;
use crate::error::{Result, SessionError, SESSION_EXPIRED_NOTICE};
use crate::storage::TokenStore;

/// Snapshot of the current session.
///
/// `authenticated` is true iff a token is present, decodes, and has not
/// expired. `primary_role` and `claims` are only set when authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub primary_role: Option<Role>,
    pub claims: Option<Claims>,
    pub generation: u64,
}

impl AuthState {
    pub fn unauthenticated(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Derive the state for a stored token as of `now`.
    pub fn from_token(token: Option<&str>, now: DateTime<Utc>, generation: u64) -> Self {
        match live_claims(token, now) {
            Ok(claims) => Self {
                authenticated: true,
                primary_role: Some(Role::primary(&claims.roles)),
                claims: Some(claims),
                generation,
            },
            Err(e) => {
                if token.is_some() {
                    tracing::debug!(error = %e, "Stored session token is not usable");
                }
                Self::unauthenticated(generation)
            }
        }
    }

    /// Exact membership in the full role set, not just the primary role.
    pub fn has_role(&self, role: Role) -> bool {
        self.claims
            .as_ref()
            .is_some_and(|c| c.has_role(role.as_str()))
    }

    /// True when an extended profile may be fetched for this session.
    pub fn is_profile_eligible(&self) -> bool {
        self.authenticated && matches!(self.primary_role, Some(r) if r != Role::None)
    }
}

/// Claims of a live session, or why there is none.
///
/// A missing token reports as [`DecodeError::Empty`](super::DecodeError::Empty).
pub fn live_claims(token: Option<&str>, now: DateTime<Utc>) -> Result<Claims> {
    let claims = claims::decode(token.unwrap_or_default())?;
    if claims.is_expired_at(now) {
        return Err(SessionError::Expired);
    }
    Ok(claims)
}

/// Owner of the session token and the state derived from it.
pub struct AuthStateStore {
    tokens: TokenStore,
    generation: AtomicU64,
    notice: Mutex<Option<String>>,
    tx: watch::Sender<AuthState>,
}

impl AuthStateStore {
    pub fn new(tokens: TokenStore) -> Self {
        let initial = AuthState::from_token(tokens.get().as_deref(), Utc::now(), 0);
        let (tx, _rx) = watch::channel(initial);
        Self {
            tokens,
            generation: AtomicU64::new(0),
            notice: Mutex::new(None),
            tx,
        }
    }

    /// Raw stored token, if any.
    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> AuthState {
        self.snapshot_at(Utc::now())
    }

    /// Re-read and re-decode the stored token as of `now`.
    ///
    /// Expired tokens are reported as unauthenticated but left in storage.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> AuthState {
        AuthState::from_token(self.tokens.get().as_deref(), now, self.generation())
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().authenticated
    }

    /// Primary role, or `None` when unauthenticated.
    pub fn user_role(&self) -> Option<Role> {
        self.snapshot().primary_role
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.snapshot().has_role(role)
    }

    pub fn user(&self) -> Option<Claims> {
        self.snapshot().claims
    }

    /// Claims of the live session, or the reason there is none.
    pub fn session(&self) -> Result<Claims> {
        live_claims(self.tokens.get().as_deref(), Utc::now())
    }

    /// Store a freshly issued token, starting a new session generation.
    pub fn sign_in(&self, token: &str) {
        self.tokens.set(token);
        *self.lock_notice() = None;
        let generation = self.advance();
        tracing::info!(generation, "Session token stored");
    }

    /// Clear the session. Safe to call repeatedly.
    pub fn sign_out(&self) {
        self.tokens.clear();
        let generation = self.advance();
        tracing::info!(generation, "Signed out");
    }

    /// End the session after the backend rejected it, leaving a notice for
    /// the sign-in view.
    pub fn invalidate(&self) {
        self.tokens.clear();
        *self.lock_notice() = Some(SESSION_EXPIRED_NOTICE.to_string());
        let generation = self.advance();
        tracing::warn!(generation, "Session rejected by server, token cleared");
    }

    /// Drop a token that cannot be decoded. No notice is recorded.
    pub fn discard_token(&self) {
        self.tokens.clear();
        let generation = self.advance();
        tracing::debug!(generation, "Discarded undecodable session token");
    }

    /// Take the pending user-facing notice, if any.
    pub fn take_notice(&self) -> Option<String> {
        self.lock_notice().take()
    }

    /// Subscribe to state published on every session change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    fn advance(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(self.snapshot());
        generation
    }

    fn lock_notice(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.notice.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStateStore")
            .field("tokens", &self.tokens)
            .field("generation", &self.generation())
            .finish()
    }
}
