//! Configuration for the conversation store.

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Default cap on stored conversations.
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10;

/// Default sliding-window cap on messages per conversation.
pub const DEFAULT_MAX_MESSAGES_PER_CONVERSATION: usize = 50;

/// Topic assigned when the caller does not provide one.
pub const DEFAULT_TOPIC: &str = "New Conversation";

/// Default greeting seeded into new conversations.
pub const INTRO_MESSAGE: &str = "Hello! I'm your documentation assistant. I can help you understand the current documentation page.\n\nSome things you can ask me:\n- Explain specific concepts or features\n- Find information about APIs or functions\n- Understand code examples\n- Clarify technical details\n- Navigate to related documentation\n\nJust ask your question, and I'll help you find the information you need!";

/// Capacity limits and seeding behaviour for the conversation store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of stored conversations; overflow evicts from the back.
    pub max_conversations: usize,
    /// Maximum messages kept per conversation; appends keep the most recent.
    pub max_messages_per_conversation: usize,
    /// Optional assistant-role greeting appended to every new conversation.
    /// Counts toward the message cap like any other message.
    pub intro_message: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            max_messages_per_conversation: DEFAULT_MAX_MESSAGES_PER_CONVERSATION,
            intro_message: Some(INTRO_MESSAGE.to_string()),
        }
    }
}

impl ConversationConfig {
    /// Same as [`Default`], but without the seeded greeting.
    #[must_use]
    pub fn without_intro() -> Self {
        Self {
            intro_message: None,
            ..Self::default()
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any capacity is zero.
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_conversations == 0 {
            return Err(StoreError::InvalidConfig(
                "max_conversations must be > 0".to_string(),
            ));
        }

        if self.max_messages_per_conversation == 0 {
            return Err(StoreError::InvalidConfig(
                "max_messages_per_conversation must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
