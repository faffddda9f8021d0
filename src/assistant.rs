//! Orchestration of one question/answer interaction.
//!
//! The assistant sits one layer above the store: it appends the user turn,
//! asks the generator for an answer grounded in the extracted page context,
//! and appends the assistant turn. The store never sees the generator or
//! the page; it only receives message payloads.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::conversations::{Conversation, ConversationId, ConversationStore, Message, StoreError};
use crate::llm::{AnswerGenerator, ApiError};

/// Assistant error type.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Conversation store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Answer generation failure. The user turn has already been persisted
    /// when this is returned.
    #[error("generation error: {0}")]
    Api(#[from] ApiError),
}

/// Convenience result alias for assistant operations.
pub type AssistantResult<T> = Result<T, AssistantError>;

/// Documentation assistant: conversation store plus answer generator.
pub struct Assistant {
    store: ConversationStore,
    generator: Arc<dyn AnswerGenerator>,
}

impl Assistant {
    /// Wire an assistant from its two collaborators.
    #[must_use]
    pub fn new(store: ConversationStore, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self { store, generator }
    }

    /// The underlying conversation store, for presentation-layer reads and
    /// conversation management (list, rename, delete).
    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Start a new conversation.
    ///
    /// # Errors
    /// Returns an error if the persistence write fails.
    pub async fn start_conversation(&self, topic: Option<&str>) -> AssistantResult<Conversation> {
        Ok(self.store.create(topic).await?)
    }

    /// Handle one user interaction: persist the user turn, generate an
    /// answer from the opaque page `context`, persist the assistant turn,
    /// and return the updated conversation.
    ///
    /// Each mutation is awaited before the next one is issued, as the
    /// store requires for writes against the same conversation.
    ///
    /// # Errors
    /// Returns an error if the conversation does not exist, a persistence
    /// write fails, or generation fails. On generation failure the user
    /// turn remains persisted.
    pub async fn ask(
        &self,
        id: &ConversationId,
        question: &str,
        context: &str,
    ) -> AssistantResult<Conversation> {
        debug!("asking in conversation {id}");
        self.store.add_message(id, Message::user(question)).await?;

        let answer = self.generator.generate(question, context).await?;
        info!("generated answer for conversation {id}");

        let updated = self
            .store
            .add_message(id, Message::assistant(answer))
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::conversations::{ConversationConfig, Role};
    use crate::llm::GenerateFuture;
    use crate::storage::MemoryBackend;

    use super::*;

    /// Generator that echoes a canned answer, or fails on demand.
    struct ScriptedGenerator {
        answer: Option<String>,
    }

    impl AnswerGenerator for ScriptedGenerator {
        fn generate<'a>(&'a self, _question: &'a str, _context: &'a str) -> GenerateFuture<'a> {
            let answer = self.answer.clone();
            Box::pin(async move {
                answer.ok_or_else(|| ApiError::Rejected("scripted failure".to_string()))
            })
        }
    }

    fn assistant_with(answer: Option<&str>) -> Assistant {
        let store = match ConversationStore::with_config(
            Arc::new(MemoryBackend::new()),
            ConversationConfig::without_intro(),
        ) {
            Ok(store) => store,
            Err(err) => unreachable!("default-shaped config must validate: {err}"),
        };
        Assistant::new(
            store,
            Arc::new(ScriptedGenerator {
                answer: answer.map(str::to_string),
            }),
        )
    }

    #[tokio::test]
    async fn test_ask_appends_user_then_assistant_turn() {
        let assistant = assistant_with(Some("Ownership moves values."));

        let Ok(conversation) = assistant.start_conversation(Some("Rust docs")).await else {
            unreachable!("start_conversation must succeed")
        };

        let asked = assistant
            .ask(&conversation.id, "What is ownership?", "chapter 4 text")
            .await;

        let Ok(updated) = asked else {
            unreachable!("ask must succeed with a scripted answer")
        };
        assert_eq!(updated.messages.len(), 2);
        assert_eq!(updated.messages[0].role, Role::User);
        assert_eq!(updated.messages[0].content, "What is ownership?");
        assert_eq!(updated.messages[1].role, Role::Assistant);
        assert_eq!(updated.messages[1].content, "Ownership moves values.");
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_user_turn() {
        let assistant = assistant_with(None);

        let Ok(conversation) = assistant.start_conversation(None).await else {
            unreachable!("start_conversation must succeed")
        };

        let asked = assistant
            .ask(&conversation.id, "What is ownership?", "chapter 4 text")
            .await;
        assert!(matches!(asked, Err(AssistantError::Api(_))));

        let Some(persisted) = assistant.store().get(&conversation.id).await else {
            unreachable!("conversation must still exist")
        };
        assert_eq!(persisted.messages.len(), 1);
        assert_eq!(persisted.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_ask_against_unknown_conversation_fails() {
        let assistant = assistant_with(Some("answer"));
        let ghost = ConversationId::from_raw("0");

        let asked = assistant.ask(&ghost, "hello?", "context").await;
        assert!(matches!(
            asked,
            Err(AssistantError::Store(StoreError::NotFound(_)))
        ));
    }
}
