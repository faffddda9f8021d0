//! Bounded conversation store.
//!
//! Single source of truth for conversation records: an in-memory snapshot
//! cached over an asynchronous key-value backend. Reads go through the
//! cache (populated once per session, no TTL); every mutation recomputes
//! the full list, applies the capacity limits, rolls the cache forward,
//! and persists the whole collection as one backend write.
//!
//! Mutations serialize on an internal lock held across mutate+persist, so
//! back-to-back writes to the same conversation cannot lose updates.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::storage::backend::StorageBackend;

use super::config::{ConversationConfig, DEFAULT_TOPIC};
use super::errors::{StoreError, StoreResult};
use super::ids::ConversationId;
use super::types::{Conversation, Message};

/// The single backend key this store owns.
pub const STORAGE_KEY: &str = "conversations";

/// Conversation store bridging an in-memory cache and a persistent backend.
pub struct ConversationStore {
    backend: Arc<dyn StorageBackend>,
    config: ConversationConfig,
    cache: RwLock<Option<Vec<Conversation>>>,
}

impl ConversationStore {
    /// Create a store with the default configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            config: ConversationConfig::default(),
            cache: RwLock::new(None),
        }
    }

    /// Create a store with a custom configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_config(
        backend: Arc<dyn StorageBackend>,
        config: ConversationConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            cache: RwLock::new(None),
        })
    }

    /// The configuration this store enforces.
    #[must_use]
    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// List all conversations, most recently created-or-updated first.
    ///
    /// Served from the cache when warm. A backend read failure degrades to
    /// an empty list so the assistant starts a fresh session instead of
    /// failing outright.
    pub async fn list(&self) -> Vec<Conversation> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref() {
                return cached.clone();
            }
        }

        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;
        list.clone()
    }

    /// Look up one conversation by id. Never errors: an unknown id and a
    /// degraded backend both read as `None`.
    pub async fn get(&self, id: &ConversationId) -> Option<Conversation> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref() {
                return cached.iter().find(|c| &c.id == id).cloned();
            }
        }

        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;
        list.iter().find(|c| &c.id == id).cloned()
    }

    /// Create, persist, and return a new conversation.
    ///
    /// The topic defaults to [`DEFAULT_TOPIC`]; when the configuration
    /// carries an intro message, it is seeded as the first assistant turn
    /// and counts toward the message cap.
    ///
    /// # Errors
    /// Returns an error if the persistence write fails.
    pub async fn create(&self, topic: Option<&str>) -> StoreResult<Conversation> {
        let messages = self
            .config
            .intro_message
            .as_ref()
            .map(|text| vec![Message::assistant(text.clone())])
            .unwrap_or_default();
        let conversation = Conversation::new(topic.unwrap_or(DEFAULT_TOPIC), messages);

        info!("creating conversation {}", conversation.id);
        self.save(conversation).await
    }

    /// Persist a full conversation value. An existing id replaces the
    /// record in its current slot; a new id is inserted at the front. The
    /// collection is then truncated to the conversation cap, evicting from
    /// the back.
    ///
    /// # Errors
    /// Returns an error if the persistence write fails.
    pub async fn save(&self, conversation: Conversation) -> StoreResult<Conversation> {
        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;

        if let Some(slot) = list.iter_mut().find(|c| c.id == conversation.id) {
            *slot = conversation.clone();
        } else {
            list.insert(0, conversation.clone());
        }

        while list.len() > self.config.max_conversations {
            if let Some(evicted) = list.pop() {
                debug!("evicting conversation {} (capacity)", evicted.id);
            }
        }

        self.persist(list).await?;
        Ok(conversation)
    }

    /// Append a message to a conversation, applying the sliding window:
    /// the most recent messages are kept, the oldest dropped, order never
    /// changed. Returns the updated conversation.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the id does not exist, or an
    /// error if the persistence write fails.
    pub async fn add_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> StoreResult<Conversation> {
        let window = self.config.max_messages_per_conversation;

        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;

        let Some(conversation) = list.iter_mut().find(|c| &c.id == id) else {
            return Err(StoreError::NotFound(id.clone()));
        };

        conversation.messages.push(message);
        if conversation.messages.len() > window {
            let overflow = conversation.messages.len() - window;
            conversation.messages.drain(..overflow);
            debug!("dropped {overflow} oldest message(s) from conversation {id}");
        }
        let updated = conversation.clone();

        self.persist(list).await?;
        Ok(updated)
    }

    /// Change a conversation's topic. Returns the updated conversation.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the id does not exist, or an
    /// error if the persistence write fails.
    pub async fn rename(&self, id: &ConversationId, new_topic: &str) -> StoreResult<Conversation> {
        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;

        let Some(conversation) = list.iter_mut().find(|c| &c.id == id) else {
            return Err(StoreError::NotFound(id.clone()));
        };

        conversation.topic = new_topic.to_string();
        let updated = conversation.clone();

        self.persist(list).await?;
        Ok(updated)
    }

    /// Remove a conversation if present. Deleting an unknown id is a no-op
    /// and does not error.
    ///
    /// # Errors
    /// Returns an error if the persistence write fails.
    pub async fn delete(&self, id: &ConversationId) -> StoreResult<()> {
        let mut guard = self.cache.write().await;
        let list = self.ensure_loaded(&mut guard).await;

        let before = list.len();
        list.retain(|c| &c.id != id);
        if list.len() < before {
            info!("deleted conversation {id}");
        }

        self.persist(list).await
    }

    /// Populate the cache slot from the backend if it is still cold.
    async fn ensure_loaded<'a>(
        &self,
        slot: &'a mut Option<Vec<Conversation>>,
    ) -> &'a mut Vec<Conversation> {
        if slot.is_none() {
            *slot = Some(self.load_from_backend().await);
        }
        slot.get_or_insert_with(Vec::new)
    }

    /// Read the stored collection, degrading to empty on any failure.
    async fn load_from_backend(&self) -> Vec<Conversation> {
        match self.backend.get(STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(list) => list,
                Err(err) => {
                    warn!("stored conversations are unreadable, starting empty: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("backend read failed, starting empty: {err}");
                Vec::new()
            }
        }
    }

    /// Write the whole collection to the backend as one atomic `set`.
    ///
    /// The cache has already been rolled forward by the caller; a failure
    /// here propagates so the mutation is never reported as persisted.
    async fn persist(&self, list: &[Conversation]) -> StoreResult<()> {
        let raw = serde_json::to_string(list)?;
        self.backend
            .set(STORAGE_KEY, raw)
            .await
            .map_err(StoreError::BackendWrite)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::storage::backend::{BackendError, BackendFuture, BackendResult};
    use crate::storage::memory::MemoryBackend;

    use super::super::types::Role;
    use super::*;

    /// Backend that fails every call, for degraded-path tests.
    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn get(&self, _key: &str) -> BackendFuture<'_, BackendResult<Option<String>>> {
            Box::pin(async { Err(BackendError::Read("backend offline".to_string())) })
        }

        fn set(&self, _key: &str, _value: String) -> BackendFuture<'_, BackendResult<()>> {
            Box::pin(async { Err(BackendError::Write("backend offline".to_string())) })
        }
    }

    /// Backend that counts reads, for cache behaviour tests.
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        reads: AtomicUsize,
    }

    impl StorageBackend for CountingBackend {
        fn get(&self, key: &str) -> BackendFuture<'_, BackendResult<Option<String>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> BackendFuture<'_, BackendResult<()>> {
            self.inner.set(key, value)
        }
    }

    fn quiet_store() -> ConversationStore {
        let store = ConversationStore::with_config(
            Arc::new(MemoryBackend::new()),
            ConversationConfig::without_intro(),
        );
        match store {
            Ok(store) => store,
            Err(err) => unreachable!("default-shaped config must validate: {err}"),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_returns_matching_record() {
        let store = ConversationStore::new(Arc::new(MemoryBackend::new()));

        let Ok(created) = store.create(Some("Rust docs")).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        let fetched = store.get(&created.id).await;
        assert_eq!(fetched, Some(created.clone()));
        assert_eq!(created.topic, "Rust docs");

        // Default config seeds exactly one assistant greeting.
        assert_eq!(created.messages.len(), 1);
        assert_eq!(created.messages[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_create_without_topic_uses_placeholder() {
        let store = quiet_store();

        let Ok(created) = store.create(None).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        assert_eq!(created.topic, DEFAULT_TOPIC);
        assert!(created.messages.is_empty());
    }

    #[tokio::test]
    async fn test_overflow_evicts_conversation_in_last_slot() {
        let store = quiet_store();

        let mut created = Vec::new();
        for n in 1..=10 {
            if let Ok(conversation) = store.create(Some(&format!("C{n}"))).await {
                created.push(conversation);
            }
        }
        assert_eq!(created.len(), 10);

        let Ok(newest) = store.create(Some("new")).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        let list = store.list().await;
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id, newest.id);

        // C1 has gone the longest without being created or updated; it sat
        // in the last slot and is the one evicted.
        assert!(store.get(&created[0].id).await.is_none());
        for survivor in &created[1..] {
            assert!(store.get(&survivor.id).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record_in_its_slot() {
        let store = quiet_store();

        let mut created = Vec::new();
        for topic in ["first", "second", "third"] {
            if let Ok(conversation) = store.create(Some(topic)).await {
                created.push(conversation);
            }
        }
        assert_eq!(created.len(), 3);

        // Edit the middle record and save the full value back.
        let mut middle = created[1].clone();
        middle.topic = "second (edited)".to_string();
        middle.messages.push(Message::user("still here?"));

        let saved = store.save(middle.clone()).await;
        assert!(saved.is_ok());

        // The edited record keeps its slot instead of moving to the front.
        let list = store.list().await;
        let topics: Vec<&str> = list.iter().map(|c| c.topic.as_str()).collect();
        assert_eq!(topics, ["third", "second (edited)", "first"]);
        assert_eq!(list[1].id, middle.id);
        assert_eq!(list[1].messages, middle.messages);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = quiet_store();

        let _ = store.create(Some("first")).await;
        let _ = store.create(Some("second")).await;
        let _ = store.create(Some("third")).await;

        let list = store.list().await;
        let topics: Vec<&str> = list.iter().map(|c| c.topic.as_str()).collect();
        assert_eq!(topics, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_message_window_keeps_most_recent_fifty() {
        let store = ConversationStore::new(Arc::new(MemoryBackend::new()));

        let Ok(created) = store.create(None).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        // One seeded greeting plus 60 appends crosses the cap.
        for n in 0..60 {
            let appended = store
                .add_message(&created.id, Message::user(format!("question {n}")))
                .await;
            assert!(appended.is_ok());
        }

        let Some(conversation) = store.get(&created.id).await else {
            unreachable!("conversation must still exist")
        };

        assert_eq!(conversation.messages.len(), 50);
        // The greeting and the earliest questions fell off the front.
        assert_eq!(conversation.messages[0].content, "question 10");
        assert_eq!(conversation.messages[49].content, "question 59");
    }

    #[tokio::test]
    async fn test_user_then_assistant_turns_stay_ordered() {
        let store = quiet_store();

        let Ok(created) = store.create(None).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        let _ = store.add_message(&created.id, Message::user("Hi")).await;
        let _ = store
            .add_message(&created.id, Message::assistant("Hello"))
            .await;

        let Some(conversation) = store.get(&created.id).await else {
            unreachable!("conversation must still exist")
        };

        assert_eq!(
            conversation.messages,
            vec![Message::user("Hi"), Message::assistant("Hello")]
        );
    }

    #[tokio::test]
    async fn test_rename_changes_topic_and_nothing_else() {
        let store = quiet_store();

        let Ok(created) = store.create(Some("before")).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        let renamed = store.rename(&created.id, "after").await;
        assert!(renamed.is_ok());

        let Some(conversation) = store.get(&created.id).await else {
            unreachable!("conversation must still exist")
        };
        assert_eq!(conversation.topic, "after");
        assert_eq!(conversation.id, created.id);
        assert_eq!(conversation.created_at, created.created_at);
        assert_eq!(conversation.messages, created.messages);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_unknown_id_is_noop() {
        let store = quiet_store();

        let Ok(created) = store.create(None).await else {
            unreachable!("create must succeed on a healthy backend")
        };

        assert!(store.delete(&created.id).await.is_ok());
        assert!(store.get(&created.id).await.is_none());

        // Deleting again is a quiet no-op.
        assert!(store.delete(&created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_id_fails_mutations_with_not_found() {
        let store = quiet_store();
        let ghost = ConversationId::from_raw("0");

        let appended = store.add_message(&ghost, Message::user("Hi")).await;
        assert!(matches!(appended, Err(StoreError::NotFound(_))));

        let renamed = store.rename(&ghost, "x").await;
        assert!(matches!(renamed, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cold_cache_reads_back_identical_collection() {
        let backend = Arc::new(MemoryBackend::new());

        let writer = ConversationStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);
        let Ok(created) = writer.create(Some("persisted")).await else {
            unreachable!("create must succeed on a healthy backend")
        };
        let _ = writer.add_message(&created.id, Message::user("Hi")).await;
        let written = writer.list().await;

        // A second store over the same backend simulates a fresh process.
        let reader = ConversationStore::new(backend as Arc<dyn StorageBackend>);
        assert_eq!(reader.list().await, written);
    }

    #[tokio::test]
    async fn test_reads_after_warmup_skip_the_backend() {
        let backend = Arc::new(CountingBackend::default());
        let store = ConversationStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>);

        let _ = store.list().await;
        let _ = store.list().await;
        let _ = store.get(&ConversationId::from_raw("0")).await;

        assert_eq!(backend.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_read_failure_degrades_to_empty_list() {
        let store = ConversationStore::new(Arc::new(FailingBackend));
        assert!(store.list().await.is_empty());
        assert!(store.get(&ConversationId::from_raw("0")).await.is_none());
    }

    #[tokio::test]
    async fn test_backend_write_failure_propagates() {
        let store = ConversationStore::new(Arc::new(FailingBackend));

        let created = store.create(Some("doomed")).await;
        assert!(matches!(created, Err(StoreError::BackendWrite(_))));

        // The cache still rolled forward optimistically; the caller just
        // knows the record did not persist.
        assert_eq!(store.list().await.len(), 1);
    }
}
