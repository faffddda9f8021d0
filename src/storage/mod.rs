//! Key-value storage backends.
//!
//! The conversation store talks to storage only through
//! [`backend::StorageBackend`]; the implementations here differ in
//! durability, not in contract.

pub mod backend;
pub mod memory;
pub mod sqlite;

pub use backend::{BackendError, BackendFuture, BackendResult, StorageBackend};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
