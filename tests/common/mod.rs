// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use bank_session::api::{ApiError, ProfileApi, ProfileRecord};
use bank_session::auth::AuthStateStore;
use bank_session::storage::{MemoryStorage, StorageAdapter, TokenStore};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Key the backend signs with. The client never sees it.
#[allow(dead_code)]
pub const BACKEND_KEY: &[u8] = b"backend_signing_key_32_bytes_min";

#[allow(dead_code)]
pub const TOKEN_KEY: &str = "bank_session_token";

#[allow(dead_code)]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Mint a session token the way the backend does.
#[allow(dead_code)]
pub fn mint(sub: &str, roles: &[&str], exp: i64) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &serde_json::json!({
            "sub": sub,
            "roles": roles,
            "iat": now(),
            "exp": exp,
            "email": format!("{}@example.com", sub),
        }),
        &EncodingKey::from_secret(BACKEND_KEY),
    )
    .expect("Failed to create JWT")
}

/// Auth store over shared in-memory storage, so tests can reach behind it.
#[allow(dead_code)]
pub fn auth_store() -> (Arc<AuthStateStore>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let tokens = TokenStore::new(storage.clone() as Arc<dyn StorageAdapter>, TOKEN_KEY);
    (Arc::new(AuthStateStore::new(tokens)), storage)
}

/// Profile API double that counts calls and can hold responses back.
#[allow(dead_code)]
pub struct FakeProfileApi {
    calls: AtomicUsize,
    response: Mutex<Result<ProfileRecord, ApiError>>,
    gate: Option<Semaphore>,
}

#[allow(dead_code)]
impl FakeProfileApi {
    pub fn returning(response: Result<ProfileRecord, ApiError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response: Mutex::new(response),
            gate: None,
        })
    }

    /// Every request waits until `release()` is called.
    pub fn gated(response: Result<ProfileRecord, ApiError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response: Mutex::new(response),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn respond_with(&self, response: Result<ProfileRecord, ApiError>) {
        *self.response.lock().unwrap() = response;
    }

    /// Yield until `n` requests have been issued.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ProfileApi for FakeProfileApi {
    async fn fetch_profile(&self, _token: &str) -> Result<ProfileRecord, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.response.lock().unwrap().clone()
    }
}

/// Profile record as the server returns it.
#[allow(dead_code)]
pub fn profile_record(id: &str) -> ProfileRecord {
    ProfileRecord {
        id: Some(id.to_string()),
        email: Some(format!("{}@example.com", id)),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        account_number: Some("0012345678".to_string()),
        ..ProfileRecord::default()
    }
}
