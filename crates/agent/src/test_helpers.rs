//! Shared test helpers for step and orchestrator tests.

use taskweave_core::error::ProviderError;
use taskweave_core::provider::{CompletionRequest, CompletionResponse, Provider, Usage};
use taskweave_core::tool::ToolRegistry;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request. Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the given texts, in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Succeed with `texts` but fail on call number `call` (1-based).
    pub fn failing_on(call: usize, texts: Vec<&str>) -> Self {
        let mut replies: Vec<Result<String, ProviderError>> =
            texts.into_iter().map(|t| Ok(t.to_string())).collect();
        let error = ProviderError::ApiError {
            status_code: 500,
            message: "scripted failure".into(),
        };
        replies.insert((call - 1).min(replies.len()), Err(error));
        Self::new(replies)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        let reply = self.replies.get(index).cloned().unwrap_or_else(|| {
            panic!(
                "ScriptedProvider: no more replies (call #{}, have {})",
                index + 1,
                self.replies.len()
            )
        });

        reply.map(|content| CompletionResponse {
            content,
            model: "mock-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// Register a tool that always fails.
pub fn failing_registry_fn(registry: &mut ToolRegistry, name: &str) {
    registry.register_fn(name, "Always fails", |_p: &str| Err("service unavailable".to_string()));
}
