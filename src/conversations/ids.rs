//! Identifier type for conversation records.
//!
//! Ids are stringified millisecond timestamps drawn from a monotonic
//! process-wide counter, so the default ordering of ids is also the
//! creation order of the conversations that carry them.

use core::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Last issued id value, in milliseconds since the Unix epoch.
static LAST_ID_MS: AtomicI64 = AtomicI64::new(0);

/// Issue the next id value: the current wall clock, bumped past any
/// previously issued value so two creations in the same millisecond
/// still get distinct, ordered ids.
fn next_id_ms() -> i64 {
    let now_ms = Utc::now().timestamp_millis();
    let mut prev = LAST_ID_MS.load(Ordering::Relaxed);
    loop {
        let candidate = now_ms.max(prev + 1);
        match LAST_ID_MS.compare_exchange_weak(
            prev,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => prev = observed,
        }
    }
}

/// Opaque unique identifier of a conversation.
///
/// Stable for the conversation's lifetime; serialized transparently as the
/// string it wraps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Generate a fresh identifier from the monotonic time source.
    #[must_use]
    pub fn generate() -> Self {
        Self(next_id_ms().to_string())
    }

    /// Wrap an existing raw id (e.g., one read back from storage).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<ConversationId> for String {
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
