//! Data model for conversations and their messages.
//!
//! The serde shapes here are the persisted wire format: conversations are
//! stored as a JSON array under a single key, with camelCase field names
//! and lowercase role tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ConversationId;

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A question typed by the user.
    User,
    /// A generated (or synthesized) answer.
    Assistant,
}

/// A single turn in a conversation. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// The question, answer, or synthesized text.
    pub content: String,
}

impl Message {
    /// Build a user-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant-role message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation record: identity, label, and bounded message history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier, assigned at creation and never changed.
    pub id: ConversationId,
    /// Free-text label, mutable via rename.
    pub topic: String,
    /// Messages in append order, at most the configured window size.
    pub messages: Vec<Message>,
    /// Creation timestamp (ISO-8601 on the wire), immutable.
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a new record with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(topic: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: ConversationId::generate(),
            topic: topic.into(),
            messages,
            created_at: Utc::now(),
        }
    }
}
