//! CLI subcommands and the shared wiring they build on.

pub mod config_cmd;
pub mod conversation;
pub mod memory;
pub mod personas;
pub mod run;
pub mod tools;

use std::sync::Arc;
use taskweave_agent::AgentService;
use taskweave_config::AppConfig;
use taskweave_core::conversation::ConversationStore;
use taskweave_memory::{InMemoryConversationStore, SqliteConversationStore, UserMemoryStore};
use taskweave_tools::SearchDocument;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Load per-user memory, from the snapshot file when persistence is on.
pub fn load_memory(config: &AppConfig) -> Result<UserMemoryStore, Box<dyn std::error::Error>> {
    if config.memory.persist {
        Ok(UserMemoryStore::load(&config.memory_snapshot_path())?)
    } else {
        Ok(UserMemoryStore::new())
    }
}

/// Write per-user memory back when persistence is on.
pub async fn save_memory(config: &AppConfig, store: &UserMemoryStore) -> CommandResult {
    if config.memory.persist {
        store.save(&config.memory_snapshot_path()).await?;
    }
    Ok(())
}

/// Open the configured conversation store.
pub async fn open_conversations(
    config: &AppConfig,
) -> Result<Arc<dyn ConversationStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn ConversationStore> = match config.conversations.backend.as_str() {
        "in_memory" => Arc::new(InMemoryConversationStore::new()),
        _ => Arc::new(SqliteConversationStore::open(&config.database_path()).await?),
    };
    Ok(store)
}

/// Build the tool registry from the `[search]` section.
pub fn build_tools(config: &AppConfig) -> taskweave_core::tool::ToolRegistry {
    let documents = config
        .search
        .documents
        .iter()
        .map(|d| SearchDocument::new(&d.title, &d.snippet))
        .collect();
    taskweave_tools::registry_with_corpus(documents, config.search.top_k)
}

/// Wire a full agent service from configuration.
pub async fn build_service(
    config: &AppConfig,
    memory: Arc<UserMemoryStore>,
) -> Result<AgentService, Box<dyn std::error::Error>> {
    let router = taskweave_providers::build_from_config(config);
    let conversations = open_conversations(config).await?;

    Ok(AgentService::new(
        router,
        Arc::new(build_tools(config)),
        Arc::new(config.persona_catalog()),
        memory,
        conversations,
    )
    .with_params(config.sampling_params())
    .with_backend_models(config.backend_models())
    .with_history_limit(config.conversations.history_limit))
}
