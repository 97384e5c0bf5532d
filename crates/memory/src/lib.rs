//! Storage for Taskweave: per-user memory and conversation history.

pub mod in_memory;
pub mod user_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryConversationStore;
pub use user_memory::UserMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConversationStore;
