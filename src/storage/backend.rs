//! Asynchronous key-value backend seam behind the conversation store.
//!
//! The store owns exactly one key in the backend's namespace and always
//! writes the full value in one call. Backends only move opaque strings;
//! (de)serialization stays in the store.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed future type for backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for backend operations, split by direction so callers can
/// recover reads and surface writes differently.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A read could not be completed.
    #[error("backend read failed: {0}")]
    Read(String),
    /// A write could not be completed or confirmed.
    #[error("backend write failed: {0}")]
    Write(String),
}

/// Convenience result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Asynchronous key-value storage.
pub trait StorageBackend: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    /// Returns [`BackendError::Read`] if storage access fails.
    fn get(&self, key: &str) -> BackendFuture<'_, BackendResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value. Resolves
    /// only once the write is confirmed.
    ///
    /// # Errors
    /// Returns [`BackendError::Write`] if the write fails.
    fn set(&self, key: &str, value: String) -> BackendFuture<'_, BackendResult<()>>;
}
