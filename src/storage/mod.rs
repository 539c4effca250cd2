//! Persisted storage for the session token.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

/// Key/value slot storage backing the session.
///
/// Implementations must not panic; a failed read is reported as `None`.
pub trait StorageAdapter: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Holder of one opaque session token. No parsing or validation.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn StorageAdapter>,
    key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Token stored in memory only, for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), crate::config::DEFAULT_TOKEN_KEY)
    }

    pub fn get(&self) -> Option<String> {
        self.storage.get(&self.key).filter(|t| !t.is_empty())
    }

    pub fn set(&self, token: &str) {
        self.storage.set(&self.key, token);
    }

    pub fn clear(&self) {
        self.storage.remove(&self.key);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("present", &self.get().is_some())
            .finish()
    }
}
