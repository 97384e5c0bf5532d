//! Conversation store trait: the conversation gateway collaborator.
//!
//! The request layer uses a store to seed prior turns into a run and to
//! persist the user/assistant exchange afterwards. The orchestrator itself
//! never touches it.

use async_trait::async_trait;
use crate::error::ConversationError;
use crate::message::{ConversationId, ConversationTurn, Role};

/// Append-only storage of conversation turns.
///
/// Implementations: SQLite, in-memory (for testing).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Create a new conversation and return its id.
    async fn create(&self, title: Option<&str>) -> Result<ConversationId, ConversationError>;

    /// Whether a conversation with this id exists.
    async fn exists(&self, id: ConversationId) -> Result<bool, ConversationError>;

    /// Append one turn. Fails with `NotFound` for an unknown conversation.
    async fn append(&self, id: ConversationId, role: Role, content: &str) -> Result<(), ConversationError>;

    /// Append a user turn and the assistant's reply as one unit: both are
    /// stored or neither is.
    async fn append_exchange(
        &self,
        id: ConversationId,
        user: &str,
        assistant: &str,
    ) -> Result<(), ConversationError>;

    /// All turns of a conversation, oldest first. Unknown ids yield an empty list.
    async fn history(&self, id: ConversationId) -> Result<Vec<ConversationTurn>, ConversationError>;
}
