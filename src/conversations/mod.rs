//! Conversation records and the bounded store that owns them.

pub mod config;
pub mod errors;
pub mod ids;
pub mod store;
pub mod types;

pub use config::ConversationConfig;
pub use errors::{StoreError, StoreResult};
pub use ids::ConversationId;
pub use store::ConversationStore;
pub use types::{Conversation, Message, Role};
