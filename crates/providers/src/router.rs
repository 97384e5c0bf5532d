//! Provider router: selects the completion backend for a request.
//!
//! The request layer passes a backend selector (or none, meaning the
//! configured default). Known-but-unimplemented backends are rejected with
//! [`ProviderError::UnsupportedBackend`]; anything else unknown with
//! [`ProviderError::UnknownBackend`].

use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::error::ProviderError;
use taskweave_core::provider::Provider;
use tracing::debug;
use crate::openai_compat::OpenAiCompatProvider;

/// Backends that are recognised but have no native client.
const UNSUPPORTED_BACKENDS: &[&str] = &["claude", "local"];

/// Routes completion requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_backend: String,
}

impl ProviderRouter {
    /// Create a new router with a default backend.
    pub fn new(default_backend: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_backend: default_backend.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    /// Pick the provider for a request; `None` selects the default backend.
    pub fn select(&self, backend: Option<&str>) -> Result<Arc<dyn Provider>, ProviderError> {
        let name = backend.unwrap_or(&self.default_backend);

        if let Some(provider) = self.get(name) {
            debug!(backend = name, "Selected completion backend");
            return Ok(provider);
        }

        if UNSUPPORTED_BACKENDS.contains(&name) {
            return Err(ProviderError::UnsupportedBackend {
                backend: name.to_string(),
                reason: "not implemented yet".into(),
            });
        }

        Err(ProviderError::UnknownBackend(name.to_string()))
    }

    /// List all registered backend names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// `openai` is always registered. Every `[providers.<name>]` entry is
/// registered as an OpenAI-compatible endpoint.
pub fn build_from_config(config: &taskweave_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_backend);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get("openai").is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        router.register("openai", Arc::new(OpenAiCompatProvider::openai(api_key)));
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
