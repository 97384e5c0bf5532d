//! # Taskweave Core
//!
//! Domain types, traits, and error definitions for the Taskweave task-chain
//! agent. This crate has **zero framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping the completion backend or conversation store via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod conversation;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod persona;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use conversation::ConversationStore;
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use memory::UserMemory;
pub use message::{ConversationId, ConversationTurn, Message, Role};
pub use persona::{AgentPersona, PersonaCatalog};
pub use provider::{CompletionRequest, CompletionResponse, Provider, SamplingParams};
pub use tool::{Tool, ToolCallRecord, ToolDescriptor, ToolRegistry};
