//! End-to-end integration tests for the Taskweave agent.
//!
//! These tests exercise the full pipeline from an inbound request to the
//! aggregate run result: backend selection, conversation seeding, prompt
//! construction, tool dispatch, memory directives and persistence.

use std::sync::Arc;

use taskweave_agent::{AgentService, RunRequest, ServiceRequest};
use taskweave_config::{AppConfig, PersonaConfig, ProviderConfig};
use taskweave_core::conversation::ConversationStore;
use taskweave_core::error::ProviderError;
use taskweave_core::event::DomainEvent;
use taskweave_core::message::{Message, Role};
use taskweave_core::persona::PersonaCatalog;
use taskweave_core::provider::{CompletionRequest, CompletionResponse, Provider};
use taskweave_core::tool::{ToolCallRecord, ToolRegistry};
use taskweave_memory::{InMemoryConversationStore, SqliteConversationStore, UserMemoryStore};
use taskweave_providers::ProviderRouter;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence.
struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    requests: std::sync::Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);
        let reply = self.replies.get(index).cloned().unwrap_or_else(|| {
            panic!("ScriptedProvider exhausted: call #{}, have {}", index + 1, self.replies.len())
        });
        reply.map(|content| CompletionResponse {
            content,
            model: "mock-model".into(),
            usage: None,
        })
    }
}

fn provider_down() -> ProviderError {
    ProviderError::Network("connection reset".into())
}

fn search_stub() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register_fn("search_web", "Search the web", |_q: &str| Ok("A, B, C".to_string()));
    tools
}

fn service_with(
    provider: Arc<ScriptedProvider>,
    tools: ToolRegistry,
    memory: Arc<UserMemoryStore>,
    conversations: Arc<dyn ConversationStore>,
) -> AgentService {
    let mut router = ProviderRouter::new("mock");
    router.register("mock", provider);
    AgentService::new(
        router,
        Arc::new(tools),
        Arc::new(PersonaCatalog::builtin()),
        memory,
        conversations,
    )
}

fn request(run: RunRequest) -> ServiceRequest {
    ServiceRequest {
        run,
        ..ServiceRequest::default()
    }
}

// ── Task chains ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_product_launch_chain() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "[TOOL] search_web: competitor X pricing\nFound 3 competitors",
        "Week 1: teaser\nWeek 2: launch",
    ]));
    let service = service_with(
        provider.clone(),
        search_stub(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(
            RunRequest::new("alice", "plan a product launch")
                .with_steps(["research competitors", "draft timeline"])
                .with_persona("market"),
        ))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(result.persona_id, "market");
    assert_eq!(result.persona_name, "Market Analyst");
    assert_eq!(result.steps.len(), 2);

    let first = &result.steps[0];
    assert_eq!(
        first.tool_calls,
        vec![ToolCallRecord::success("search_web", "competitor X pricing", "A, B, C")]
    );
    assert_eq!(first.headline, "Found 3 competitors");
    assert_eq!(result.steps[1].headline, "Week 2: launch");

    assert_eq!(result.tool_calls.len(), 1);
    assert_eq!(result.result, "Found 3 competitors\nWeek 2: launch");
}

#[tokio::test]
async fn e2e_provider_failure_on_second_step_fails_the_run() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("Found 3 competitors".into()),
        Err(provider_down()),
    ]));
    let memory = Arc::new(UserMemoryStore::new());
    let conversations = Arc::new(InMemoryConversationStore::new());
    let conversation = conversations.create(None).await.unwrap();
    let service = service_with(provider.clone(), search_stub(), memory.clone(), conversations.clone());

    let outcome = service
        .handle(ServiceRequest {
            run: RunRequest::new("alice", "plan a product launch")
                .with_steps(["research competitors", "draft timeline"]),
            backend: None,
            conversation: Some(conversation),
        })
        .await;

    match outcome {
        Err(taskweave_core::Error::Provider(ProviderError::Network(_))) => {}
        Err(other) => panic!("expected provider error, got {other}"),
        Ok(result) => panic!("expected failure, got {} steps", result.steps.len()),
    }
    assert_eq!(provider.calls(), 2);
    assert!(conversations.history(conversation).await.unwrap().is_empty());
}

#[tokio::test]
async fn e2e_chain_of_n_steps_calls_provider_n_times() {
    let chain = ["a", "b", "c", "d", "e"];
    let provider = Arc::new(ScriptedProvider::texts(&["1", "2", "3", "4", "5"]));
    let service = service_with(
        provider.clone(),
        ToolRegistry::new(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(RunRequest::new("bob", "goal").with_steps(chain)))
        .await
        .unwrap();

    assert_eq!(provider.calls(), chain.len());
    let sub_goals: Vec<&str> = result.steps.iter().map(|s| s.sub_goal.as_str()).collect();
    assert_eq!(sub_goals, chain);
}

#[tokio::test]
async fn e2e_implicit_single_step() {
    let provider = Arc::new(ScriptedProvider::texts(&["Draft ready.\nShip it on Monday."]));
    let service = service_with(
        provider.clone(),
        ToolRegistry::new(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(RunRequest::new("bob", "when should we ship?")))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 1);
    assert!(result.task_chain.is_empty());
    assert_eq!(result.result, "Ship it on Monday.");
    assert_eq!(result.persona_id, "general");
}

#[tokio::test]
async fn e2e_unknown_and_malformed_tools_degrade_gracefully() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "[TOOL] teleport: mars\n[TOOL] search_web\n[TOOL] search_web: ok\nDone anyway",
    ]));
    let service = service_with(
        provider,
        search_stub(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(RunRequest::new("carol", "goal")))
        .await
        .unwrap();

    let step = &result.steps[0];
    assert_eq!(step.lines[0], "unknown tool: teleport");
    assert!(step.lines[1].starts_with("parse failed:"));
    assert_eq!(step.tool_calls.len(), 1);
    assert_eq!(step.headline, "Done anyway");
}

#[tokio::test]
async fn e2e_builtin_search_tool_from_model_output() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        "[TOOL] search_web: launch timeline\nUse weekly milestones",
    ]));
    let service = service_with(
        provider,
        taskweave_tools::default_registry(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(RunRequest::new("dave", "goal")))
        .await
        .unwrap();

    let call = &result.tool_calls[0];
    assert_eq!(call.tool, "search_web");
    assert!(!call.failed);
    assert!(call.result.starts_with("1. "));
}

// ── Memory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_memory_flows_forward_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("memory.json");

    let provider = Arc::new(ScriptedProvider::texts(&[
        "Remember: launch date is May 4",
        "Timeline anchored on May 4",
    ]));
    let memory = Arc::new(UserMemoryStore::new());
    let service = service_with(
        provider.clone(),
        ToolRegistry::new(),
        memory.clone(),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(
            RunRequest::new("alice", "plan").with_steps(["pick a date", "draft timeline"]),
        ))
        .await
        .unwrap();

    let requests = provider.requests();
    assert!(!requests[0].system.contains("launch date is May 4"));
    assert!(requests[1].system.contains("- memory_1: Remember: launch date is May 4"));
    assert_eq!(result.memory.len(), 1);

    memory.save(&snapshot).await.unwrap();
    let reloaded = UserMemoryStore::load(&snapshot).unwrap();
    assert_eq!(reloaded.get("alice").await.get("memory_1"), Some("Remember: launch date is May 4"));
}

#[tokio::test]
async fn e2e_two_writes_never_collide() {
    let provider = Arc::new(ScriptedProvider::texts(&["记住 喜欢简短回答", "记住 预算一万"]));
    let memory = Arc::new(UserMemoryStore::new());
    let service = service_with(
        provider,
        ToolRegistry::new(),
        memory.clone(),
        Arc::new(InMemoryConversationStore::new()),
    );

    for goal in ["first", "second"] {
        service
            .handle(request(RunRequest::new("erin", goal)))
            .await
            .unwrap();
    }

    let stored = memory.get("erin").await;
    assert_eq!(stored.get("memory_1"), Some("记住 喜欢简短回答"));
    assert_eq!(stored.get("memory_2"), Some("记住 预算一万"));
}

#[tokio::test]
async fn e2e_concurrent_runs_for_one_user_do_not_lose_writes() {
    let replies: Vec<&str> = vec!["Remember: note"; 8];
    let provider = Arc::new(ScriptedProvider::texts(&replies));
    let memory = Arc::new(UserMemoryStore::new());
    let service = Arc::new(service_with(
        provider,
        ToolRegistry::new(),
        memory.clone(),
        Arc::new(InMemoryConversationStore::new()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .handle(request(RunRequest::new("frank", format!("goal {i}"))))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(memory.get("frank").await.len(), 8);
}

// ── Conversations ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_sqlite_conversation_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteConversationStore::open(&dir.path().join("conversations.db"))
            .await
            .unwrap(),
    );
    let conversation = store.create(Some("launch")).await.unwrap();

    let provider = Arc::new(ScriptedProvider::texts(&["Plan A", "Plan B refined"]));
    let service = service_with(
        provider.clone(),
        ToolRegistry::new(),
        Arc::new(UserMemoryStore::new()),
        store.clone(),
    );

    for goal in ["plan a launch", "refine it"] {
        service
            .handle(ServiceRequest {
                run: RunRequest::new("gina", goal),
                backend: None,
                conversation: Some(conversation),
            })
            .await
            .unwrap();
    }

    assert_eq!(
        provider.requests()[1].history,
        vec![Message::user("plan a launch"), Message::assistant("Plan A")]
    );

    let turns = store.history(conversation).await.unwrap();
    let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(turns[3].content, "Plan B refined");
}

// ── Configuration ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_backend_selector_from_config() {
    let config = AppConfig::default();
    let service = AgentService::new(
        taskweave_providers::build_from_config(&config),
        Arc::new(ToolRegistry::new()),
        Arc::new(config.persona_catalog()),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    for (backend, unsupported) in [("claude", true), ("local", true), ("palm", false)] {
        let err = service
            .handle(ServiceRequest {
                run: RunRequest::new("hal", "goal"),
                backend: Some(backend.into()),
                conversation: None,
            })
            .await
            .unwrap_err();

        match err {
            taskweave_core::Error::Provider(ProviderError::UnsupportedBackend { .. }) => assert!(unsupported),
            taskweave_core::Error::Provider(ProviderError::UnknownBackend(_)) => assert!(!unsupported),
            other => panic!("unexpected error for {backend}: {other}"),
        }
    }
}

#[tokio::test]
async fn e2e_configured_persona_overrides_builtin() {
    let mut config = AppConfig::default();
    config.personas.push(PersonaConfig {
        id: "market".into(),
        name: "Growth Strategist".into(),
        description: String::new(),
        system_prompt: "You plan growth experiments.".into(),
    });

    let provider = Arc::new(ScriptedProvider::texts(&["ok"]));
    let mut router = ProviderRouter::new("mock");
    router.register("mock", provider.clone());
    let service = AgentService::new(
        router,
        Arc::new(ToolRegistry::new()),
        Arc::new(config.persona_catalog()),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let result = service
        .handle(request(RunRequest::new("ivy", "goal").with_persona("market")))
        .await
        .unwrap();

    assert_eq!(result.persona_name, "Growth Strategist");
    assert!(provider.requests()[0].system.starts_with("You plan growth experiments."));
}

#[tokio::test]
async fn e2e_provider_default_model_is_requested() {
    let mut config = AppConfig::default();
    config.providers.insert(
        "ollama".into(),
        ProviderConfig {
            api_key: None,
            api_url: Some("http://localhost:11434/v1".into()),
            default_model: Some("llama3".into()),
        },
    );

    let provider = Arc::new(ScriptedProvider::texts(&["ok"]));
    let mut router = ProviderRouter::new("openai");
    router.register("ollama", provider.clone());
    let service = AgentService::new(
        router,
        Arc::new(ToolRegistry::new()),
        Arc::new(config.persona_catalog()),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    )
    .with_params(config.sampling_params())
    .with_backend_models(config.backend_models());

    service
        .handle(ServiceRequest {
            run: RunRequest::new("alice", "goal"),
            backend: Some("ollama".into()),
            conversation: None,
        })
        .await
        .unwrap();

    assert_eq!(provider.requests()[0].params.model, "llama3");
}

// ── Events ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_subscriber_drains_every_event_after_service_drop() {
    let provider = Arc::new(ScriptedProvider::texts(&["one", "two"]));
    let service = service_with(
        provider,
        ToolRegistry::new(),
        Arc::new(UserMemoryStore::new()),
        Arc::new(InMemoryConversationStore::new()),
    );

    let mut rx = service.event_bus().subscribe();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(event) = rx.recv().await {
            seen.push(event);
        }
        seen
    });

    service
        .handle(request(RunRequest::new("erin", "goal").with_steps(["a", "b"])))
        .await
        .unwrap();
    drop(service);

    let seen = collector.await.unwrap();
    assert!(matches!(seen.first().map(|e| e.as_ref()), Some(DomainEvent::RunStarted { .. })));
    assert!(matches!(seen.last().map(|e| e.as_ref()), Some(DomainEvent::RunCompleted { .. })));
    let steps = seen
        .iter()
        .filter(|e| matches!(e.as_ref(), DomainEvent::StepCompleted { .. }))
        .count();
    assert_eq!(steps, 2);
}
