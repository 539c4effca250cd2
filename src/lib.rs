// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Bank-Session: client-side session and authorization core
//!
//! This crate decides, on every navigation of the banking web client, whether
//! the current visitor may see a view and where to send them otherwise. It
//! owns the persisted session token, the claims decoded from it, role
//! precedence, the route guards, and the role-gated profile fetch.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod profile;
pub mod storage;

use api::ProfileApi;
use auth::AuthStateStore;
use config::Config;
use profile::ProfileStore;
use std::sync::Arc;

/// Shared session state for one client.
pub struct Session<A: ProfileApi> {
    pub config: Config,
    pub auth: Arc<AuthStateStore>,
    pub profile: Arc<ProfileStore<A>>,
}

impl<A: ProfileApi> Session<A> {
    /// Wire an auth store and a profile store over the same token storage.
    pub fn new(config: Config, storage: Arc<dyn storage::StorageAdapter>, api: A) -> Self {
        let tokens = storage::TokenStore::new(storage, config.token_key.clone());
        let auth = Arc::new(AuthStateStore::new(tokens));
        let profile = Arc::new(ProfileStore::new(auth.clone(), api));
        Self {
            config,
            auth,
            profile,
        }
    }
}
