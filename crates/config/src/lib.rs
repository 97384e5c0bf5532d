//! Configuration loading, validation, and management for Taskweave.
//!
//! Loads configuration from `~/.taskweave/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use taskweave_core::persona::{AgentPersona, PersonaCatalog};
use taskweave_core::provider::SamplingParams;

/// The root configuration structure.
///
/// Maps directly to `~/.taskweave/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion backend used when a request names none
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Conversation store configuration
    #[serde(default)]
    pub conversations: ConversationConfig,

    /// Agent behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Text-search tool configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Extra personas (or overrides of built-in ones)
    #[serde(default)]
    pub personas: Vec<PersonaConfig>,
}

fn default_backend() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_backend", &self.default_backend)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("memory", &self.memory)
            .field("conversations", &self.conversations)
            .field("agent", &self.agent)
            .field("search", &self.search)
            .field("providers", &self.providers)
            .field("personas", &self.personas)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Save per-user memory to a JSON snapshot between invocations
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Snapshot location (default: `~/.taskweave/memory.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            persist: true,
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_conversation_backend")]
    pub backend: String,

    /// SQLite database file (default: `~/.taskweave/conversations.db`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,

    /// Maximum number of prior turns seeded into a run
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_conversation_backend() -> String {
    "sqlite".into()
}
fn default_history_limit() -> usize {
    20
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            backend: default_conversation_backend(),
            database_path: None,
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Persona used when a request names none
    #[serde(default = "default_persona")]
    pub default_persona: String,

    /// Default user id for CLI runs
    #[serde(default = "default_user")]
    pub default_user: String,
}

fn default_persona() -> String {
    "general".into()
}
fn default_user() -> String {
    "default".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_persona: default_persona(),
            default_user: default_user(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of snippets returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Documents searched by the `search_web` tool (empty = built-in corpus)
    #[serde(default)]
    pub documents: Vec<SearchDocumentConfig>,
}

fn default_top_k() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            documents: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocumentConfig {
    pub title: String,
    pub snippet: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// A persona declared in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
}

impl From<&PersonaConfig> for AgentPersona {
    fn from(p: &PersonaConfig) -> Self {
        AgentPersona::new(&p.id, &p.name, &p.description, &p.system_prompt)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.taskweave/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TASKWEAVE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `TASKWEAVE_BACKEND` overrides the default backend
    /// - `TASKWEAVE_MODEL` overrides the default model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TASKWEAVE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(backend) = std::env::var("TASKWEAVE_BACKEND") {
            config.default_backend = backend;
        }

        if let Ok(model) = std::env::var("TASKWEAVE_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".taskweave")
    }

    /// Where the memory snapshot lives.
    pub fn memory_snapshot_path(&self) -> PathBuf {
        self.memory
            .snapshot_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("memory.json"))
    }

    /// Where the SQLite conversation database lives.
    pub fn database_path(&self) -> PathBuf {
        self.conversations
            .database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("conversations.db"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.default_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_tokens must be > 0".into(),
            ));
        }

        if self.search.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "search.top_k must be >= 1".into(),
            ));
        }

        if let Some(p) = self.personas.iter().find(|p| p.id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "persona '{}' has an empty id",
                p.name
            )));
        }

        match self.conversations.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "conversations.backend must be 'sqlite' or 'in_memory', got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model requested from `backend`: its `[providers.<name>]` default model,
    /// else the top-level `default_model`.
    pub fn model_for(&self, backend: &str) -> String {
        self.providers
            .get(backend)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Sampling parameters for completions sent to `backend`.
    pub fn sampling_params_for(&self, backend: &str) -> SamplingParams {
        SamplingParams {
            model: self.model_for(backend),
            temperature: self.default_temperature,
            max_tokens: Some(self.default_max_tokens),
            ..SamplingParams::default()
        }
    }

    /// Sampling parameters for the default backend.
    pub fn sampling_params(&self) -> SamplingParams {
        self.sampling_params_for(&self.default_backend)
    }

    /// Resolved model for every backend the router registers.
    pub fn backend_models(&self) -> HashMap<String, String> {
        self.providers
            .keys()
            .map(String::as_str)
            .chain(["openai", self.default_backend.as_str()])
            .map(|name| (name.to_string(), self.model_for(name)))
            .collect()
    }

    /// Built-in personas plus those declared in the config file.
    pub fn persona_catalog(&self) -> PersonaCatalog {
        PersonaCatalog::builtin().with_personas(self.personas.iter().map(AgentPersona::from))
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_backend: default_backend(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            memory: MemoryConfig::default(),
            conversations: ConversationConfig::default(),
            agent: AgentConfig::default(),
            search: SearchConfig::default(),
            providers: HashMap::new(),
            personas: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
