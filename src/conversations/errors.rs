//! Error types for the conversation store.

use thiserror::Error;

use crate::storage::backend::BackendError;

use super::ids::ConversationId;

/// Conversation store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The target conversation id does not exist. Ids only come from prior
    /// reads of the same store, so callers should treat this as a
    /// programming error rather than recoverable input.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
    /// The backend rejected or failed the persistence write. The in-memory
    /// state has already been rolled forward; the caller must not report
    /// the mutation as persisted.
    #[error("backend write failed: {0}")]
    BackendWrite(#[source] BackendError),
    /// The conversation list could not be encoded for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
