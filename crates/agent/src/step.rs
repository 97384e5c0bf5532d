//! Step executor: one completion, parsed and dispatched.
//!
//! For a single sub-goal the executor builds the instruction block, asks the
//! provider for a completion, classifies the reply line by line, runs every
//! tool call in textual order and folds remember directives into the user's
//! memory. Tool and parse failures become diagnostic lines. Only a provider
//! failure is returned as an error.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use taskweave_core::error::{ProviderError, ToolError};
use taskweave_core::event::{DomainEvent, EventBus};
use taskweave_core::memory::UserMemory;
use taskweave_core::message::Message;
use taskweave_core::persona::AgentPersona;
use taskweave_core::provider::{CompletionRequest, Provider, SamplingParams};
use taskweave_core::tool::{ToolCallRecord, ToolRegistry};
use tracing::{debug, info, warn};

use crate::prompt::{PromptMode, build_instructions};
use crate::protocol::{ResponseLine, is_remember_directive, parse_response};

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The sub-goal this step worked on.
    pub sub_goal: String,
    /// Narrative and diagnostic lines, in reply order.
    pub lines: Vec<String>,
    /// Tool invocations, in reply order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Memory keys written by this step.
    pub remembered: Vec<String>,
    /// Last narrative or diagnostic line, or the raw reply when there is none.
    pub headline: String,
}

/// What a single step needs besides the user's memory.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub user_id: &'a str,
    pub sub_goal: &'a str,
    pub mode: PromptMode<'a>,
    pub persona: &'a AgentPersona,
    /// Prior conversation turns sent ahead of the sub-goal.
    pub history: &'a [Message],
}

/// Runs one sub-goal against the provider and the tool registry.
pub struct StepExecutor {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    params: SamplingParams,
    event_bus: Arc<EventBus>,
}

impl StepExecutor {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        params: SamplingParams,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            params,
            event_bus,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Execute one step, writing remembered lines into `memory`.
    pub async fn execute(
        &self,
        input: StepInput<'_>,
        memory: &mut UserMemory,
    ) -> Result<StepResult, ProviderError> {
        let system = build_instructions(
            input.persona,
            input.sub_goal,
            input.mode,
            &self.tools.describe_all(),
            memory,
        );

        let request = CompletionRequest {
            system,
            history: input.history.to_vec(),
            user: input.sub_goal.to_string(),
            params: self.params.clone(),
        };

        debug!(
            provider = self.provider.name(),
            sub_goal = input.sub_goal,
            "Requesting completion"
        );
        let response = self.provider.complete(request).await?;
        let raw = response.content;

        let mut lines = Vec::new();
        let mut tool_calls = Vec::new();

        for line in parse_response(&raw) {
            match line {
                ResponseLine::Narrative(text) => lines.push(text),
                ResponseLine::ToolCall { name, parameter } => {
                    if let Some(record) = self.dispatch(&name, &parameter, &mut lines).await {
                        tool_calls.push(record);
                    }
                }
                ResponseLine::Malformed { raw, error } => {
                    warn!(line = %raw, "Malformed tool call");
                    lines.push(format!("parse failed: {error}"));
                }
            }
        }

        let mut remembered = Vec::new();
        for text in lines.iter().filter(|t| is_remember_directive(t)) {
            let key = memory.remember(text.as_str());
            info!(user_id = input.user_id, key = %key, "Stored memory entry");
            self.event_bus.publish(DomainEvent::MemoryWritten {
                user_id: input.user_id.to_string(),
                key: key.clone(),
                timestamp: Utc::now(),
            });
            remembered.push(key);
        }

        let headline = lines.last().cloned().unwrap_or(raw);

        Ok(StepResult {
            sub_goal: input.sub_goal.to_string(),
            lines,
            tool_calls,
            remembered,
            headline,
        })
    }

    /// Invoke one tool, appending its diagnostic line.
    ///
    /// Unknown tools produce no record.
    async fn dispatch(
        &self,
        name: &str,
        parameter: &str,
        lines: &mut Vec<String>,
    ) -> Option<ToolCallRecord> {
        let started = Instant::now();
        let outcome = self.tools.invoke(name, parameter).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = match outcome {
            Ok(result) => {
                debug!(tool = name, duration_ms, "Tool call succeeded");
                lines.push(format!("[tool call] {name}({parameter}) => {result}"));
                ToolCallRecord::success(name, parameter, result)
            }
            Err(ToolError::NotFound(_)) => {
                warn!(tool = name, "Unknown tool requested");
                lines.push(format!("unknown tool: {name}"));
                return None;
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                lines.push(format!("parse failed: {e}"));
                ToolCallRecord::failure(name, parameter, e.to_string())
            }
        };

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: name.to_string(),
            success: !record.failed,
            duration_ms,
            timestamp: Utc::now(),
        });

        Some(record)
    }
}
