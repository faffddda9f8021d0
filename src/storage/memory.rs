//! In-process key-value backend.
//!
//! Infallible and non-durable: suited to tests and to sessions that do not
//! need history to survive a restart.

use dashmap::DashMap;

use super::backend::{BackendFuture, BackendResult, StorageBackend};

/// Thread-safe, in-memory [`StorageBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, String>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> BackendFuture<'_, BackendResult<Option<String>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String) -> BackendFuture<'_, BackendResult<()>> {
        self.entries.insert(key.to_string(), value);
        Box::pin(async move { Ok(()) })
    }
}
