//! In-memory conversation store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use taskweave_core::conversation::ConversationStore;
use taskweave_core::error::ConversationError;
use taskweave_core::message::{ConversationId, ConversationTurn, Role};
use tokio::sync::RwLock;

#[derive(Debug)]
struct StoredConversation {
    title: Option<String>,
    turns: Vec<ConversationTurn>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    conversations: BTreeMap<ConversationId, StoredConversation>,
}

/// A conversation store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<Inner>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The title a conversation was created with.
    pub async fn title(&self, id: ConversationId) -> Option<String> {
        self.inner
            .read()
            .await
            .conversations
            .get(&id)
            .and_then(|c| c.title.clone())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(&self, title: Option<&str>) -> Result<ConversationId, ConversationError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = ConversationId(inner.last_id);
        inner.conversations.insert(
            id,
            StoredConversation {
                title: title.map(String::from),
                turns: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn exists(&self, id: ConversationId) -> Result<bool, ConversationError> {
        Ok(self.inner.read().await.conversations.contains_key(&id))
    }

    async fn append(&self, id: ConversationId, role: Role, content: &str) -> Result<(), ConversationError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(ConversationError::NotFound(id.0))?;
        conversation.turns.push(ConversationTurn::new(id, role, content));
        Ok(())
    }

    async fn append_exchange(
        &self,
        id: ConversationId,
        user: &str,
        assistant: &str,
    ) -> Result<(), ConversationError> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(ConversationError::NotFound(id.0))?;
        conversation.turns.extend([
            ConversationTurn::new(id, Role::User, user),
            ConversationTurn::new(id, Role::Assistant, assistant),
        ]);
        Ok(())
    }

    async fn history(&self, id: ConversationId) -> Result<Vec<ConversationTurn>, ConversationError> {
        Ok(self
            .inner
            .read()
            .await
            .conversations
            .get(&id)
            .map(|c| c.turns.clone())
            .unwrap_or_default())
    }
}
