//! Request handling around the orchestrator.
//!
//! The service is the boundary between an inbound request and a run. It
//! picks the completion backend, seeds prior conversation turns into the
//! run and, only when the run succeeds, appends the goal and the final
//! answer to the conversation.

use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::conversation::ConversationStore;
use taskweave_core::error::ConversationError;
use taskweave_core::event::EventBus;
use taskweave_core::message::{ConversationId, Message};
use taskweave_core::persona::PersonaCatalog;
use taskweave_core::provider::SamplingParams;
use taskweave_core::tool::ToolRegistry;
use taskweave_memory::UserMemoryStore;
use taskweave_providers::ProviderRouter;
use tracing::{debug, info};

use crate::orchestrator::{RunRequest, RunResult, TaskChainOrchestrator};
use crate::step::StepExecutor;

/// Default number of prior turns seeded into a run.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// An inbound run request as the outer surface sees it.
#[derive(Debug, Clone, Default)]
pub struct ServiceRequest {
    pub run: RunRequest,
    /// Backend selector; `None` uses the router's default.
    pub backend: Option<String>,
    /// Conversation to seed from and record into.
    pub conversation: Option<ConversationId>,
}

/// Everything a run needs, owned once per process.
pub struct AgentService {
    router: ProviderRouter,
    tools: Arc<ToolRegistry>,
    personas: Arc<PersonaCatalog>,
    memory: Arc<UserMemoryStore>,
    conversations: Arc<dyn ConversationStore>,
    params: SamplingParams,
    backend_models: HashMap<String, String>,
    event_bus: Arc<EventBus>,
    history_limit: usize,
}

impl AgentService {
    pub fn new(
        router: ProviderRouter,
        tools: Arc<ToolRegistry>,
        personas: Arc<PersonaCatalog>,
        memory: Arc<UserMemoryStore>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            router,
            tools,
            personas,
            memory,
            conversations,
            params: SamplingParams::default(),
            backend_models: HashMap::new(),
            event_bus: Arc::new(EventBus::default()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Set the sampling parameters sent with every completion.
    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Model to request per backend name; unlisted backends keep the model in `params`.
    pub fn with_backend_models(mut self, models: HashMap<String, String>) -> Self {
        self.backend_models = models;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn personas(&self) -> &PersonaCatalog {
        &self.personas
    }

    pub fn memory(&self) -> &Arc<UserMemoryStore> {
        &self.memory
    }

    pub fn conversations(&self) -> &Arc<dyn ConversationStore> {
        &self.conversations
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The last `history_limit` turns of a conversation, as messages.
    async fn seed_history(&self, id: ConversationId) -> Result<Vec<Message>, ConversationError> {
        if !self.conversations.exists(id).await? {
            return Err(ConversationError::NotFound(id.0));
        }
        let turns = self.conversations.history(id).await?;
        let skip = turns.len().saturating_sub(self.history_limit);
        Ok(turns.iter().skip(skip).map(|t| t.to_message()).collect())
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: ServiceRequest) -> Result<RunResult, taskweave_core::Error> {
        let backend = request
            .backend
            .clone()
            .unwrap_or_else(|| self.router.default_backend().to_string());
        let provider = self.router.select(Some(&backend))?;

        let mut params = self.params.clone();
        if let Some(model) = self.backend_models.get(&backend) {
            params.model = model.clone();
        }
        debug!(backend = %backend, model = %params.model, "Selected backend");

        let mut run = request.run;
        if let Some(id) = request.conversation {
            let mut history = self.seed_history(id).await?;
            debug!(conversation_id = %id, turns = history.len(), "Seeded conversation history");
            history.extend(run.history.drain(..));
            run.history = history;
        }

        let executor = StepExecutor::new(
            provider,
            Arc::clone(&self.tools),
            params,
            Arc::clone(&self.event_bus),
        );
        let orchestrator = TaskChainOrchestrator::new(
            executor,
            Arc::clone(&self.personas),
            Arc::clone(&self.memory),
            Arc::clone(&self.event_bus),
        );

        let result = orchestrator.run(run).await?;

        if let Some(id) = request.conversation {
            self.conversations
                .append_exchange(id, &result.goal, &result.result)
                .await?;
            info!(conversation_id = %id, "Recorded exchange");
        }

        Ok(result)
    }
}
