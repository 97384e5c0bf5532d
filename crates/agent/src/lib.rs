//! The task-chain agent: the heart of Taskweave.
//!
//! A run follows a fixed, sequential chain:
//!
//! 1. **Resolve** the persona and lock the user's memory
//! 2. **For each sub-goal**: build the instruction block, request a completion,
//!    classify the reply into narrative lines and tool calls
//! 3. **Dispatch** tool calls in textual order; failures become diagnostic lines
//! 4. **Remember** lines flagged as memory directives
//! 5. **Aggregate** step headlines into the final answer
//!
//! An empty chain is a single implicit step asked for the final answer.

pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod service;
pub mod step;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use orchestrator::{RunRequest, RunResult, TaskChainOrchestrator};
pub use prompt::{PromptMode, build_instructions};
pub use protocol::{ResponseLine, TOOL_MARKER, classify_line, is_remember_directive, parse_response};
pub use service::{AgentService, DEFAULT_HISTORY_LIMIT, ServiceRequest};
pub use step::{StepExecutor, StepInput, StepResult};
