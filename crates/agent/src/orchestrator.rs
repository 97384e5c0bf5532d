//! Task-chain orchestration.
//!
//! A run drives the step executor once per sub-goal, strictly in order:
//!
//! ```text
//! Pending ──▶ Running(0) ──▶ Running(1) ──▶ … ──▶ Done
//!                 │               │
//!                 └──── provider failure ────▶ Err (no RunResult)
//! ```
//!
//! An empty task chain runs one implicit step over the whole goal, asked for
//! a final answer instead of a sub-task result. The user's memory is locked
//! for the whole run, so every step sees the writes of the steps before it
//! and concurrent runs for the same user cannot interleave.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskweave_core::event::{DomainEvent, EventBus};
use taskweave_core::memory::UserMemory;
use taskweave_core::message::Message;
use taskweave_core::persona::{DEFAULT_PERSONA_ID, PersonaCatalog};
use taskweave_core::tool::ToolCallRecord;
use taskweave_memory::UserMemoryStore;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::prompt::PromptMode;
use crate::step::{StepExecutor, StepInput, StepResult};

/// One inbound run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub user_id: String,
    pub goal: String,
    /// Ordered sub-goals; empty means a single implicit step.
    pub task_chain: Vec<String>,
    /// Persona id; unknown or absent ids use the default persona.
    pub persona_id: Option<String>,
    /// Prior conversation turns, oldest first.
    pub history: Vec<Message>,
}

impl RunRequest {
    pub fn new(user_id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            goal: goal.into(),
            ..Self::default()
        }
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_chain = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// The aggregate outcome of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub goal: String,
    /// Empty for an implicit single-step run.
    pub task_chain: Vec<String>,
    pub steps: Vec<StepResult>,
    /// Every tool call of every step, in order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// The user's memory after the run.
    pub memory: UserMemory,
    /// Final answer.
    pub result: String,
    pub persona_id: String,
    pub persona_name: String,
}

/// Progress through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Pending,
    Running(usize),
    Done,
}

/// Drives a task chain through the step executor.
pub struct TaskChainOrchestrator {
    executor: StepExecutor,
    personas: Arc<PersonaCatalog>,
    memory: Arc<UserMemoryStore>,
    event_bus: Arc<EventBus>,
}

impl TaskChainOrchestrator {
    pub fn new(
        executor: StepExecutor,
        personas: Arc<PersonaCatalog>,
        memory: Arc<UserMemoryStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            executor,
            personas,
            memory,
            event_bus,
        }
    }

    pub fn personas(&self) -> &PersonaCatalog {
        &self.personas
    }

    pub fn memory_store(&self) -> &Arc<UserMemoryStore> {
        &self.memory
    }

    /// Execute a run to completion.
    ///
    /// A provider failure in any step aborts the rest of the chain, restores
    /// the user's memory to its state before the run and returns the error.
    pub async fn run(&self, request: RunRequest) -> Result<RunResult, taskweave_core::Error> {
        let run_id = Uuid::new_v4().to_string();
        let persona = self
            .personas
            .resolve(request.persona_id.as_deref().unwrap_or(DEFAULT_PERSONA_ID));

        let implicit = request.task_chain.is_empty();
        let total = if implicit { 1 } else { request.task_chain.len() };

        let mut memory = self.memory.lock(&request.user_id).await;
        let memory_before = memory.clone();

        info!(
            run_id = %run_id,
            user_id = %request.user_id,
            persona = %persona.id,
            steps = total,
            "Run started"
        );
        self.event_bus.publish(DomainEvent::RunStarted {
            run_id: run_id.clone(),
            user_id: request.user_id.clone(),
            persona: persona.id.clone(),
            steps: total,
            timestamp: Utc::now(),
        });

        let mut steps: Vec<StepResult> = Vec::with_capacity(total);
        let mut state = ChainState::Pending;

        loop {
            state = match state {
                ChainState::Pending => ChainState::Running(0),
                ChainState::Running(index) => {
                    let (sub_goal, mode) = if implicit {
                        (request.goal.as_str(), PromptMode::Final)
                    } else {
                        (
                            request.task_chain[index].as_str(),
                            PromptMode::ChainStep {
                                index,
                                total,
                                goal: &request.goal,
                            },
                        )
                    };

                    debug!(run_id = %run_id, index, sub_goal, "Running step");
                    let input = StepInput {
                        user_id: &request.user_id,
                        sub_goal,
                        mode,
                        persona,
                        history: &request.history,
                    };

                    let step = match self.executor.execute(input, &mut memory).await {
                        Ok(step) => step,
                        Err(e) => {
                            *memory = memory_before;
                            error!(run_id = %run_id, index, error = %e, "Run failed");
                            self.event_bus.publish(DomainEvent::RunFailed {
                                run_id,
                                step: index,
                                error_message: e.to_string(),
                                timestamp: Utc::now(),
                            });
                            return Err(e.into());
                        }
                    };

                    self.event_bus.publish(DomainEvent::StepCompleted {
                        run_id: run_id.clone(),
                        index,
                        sub_goal: step.sub_goal.clone(),
                        tool_calls: step.tool_calls.len(),
                        timestamp: Utc::now(),
                    });
                    steps.push(step);

                    if index + 1 < total {
                        ChainState::Running(index + 1)
                    } else {
                        ChainState::Done
                    }
                }
                ChainState::Done => break,
            };
        }

        let tool_calls: Vec<ToolCallRecord> = steps
            .iter()
            .flat_map(|s| s.tool_calls.iter().cloned())
            .collect();

        let result = steps
            .iter()
            .map(|s| s.headline.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        info!(run_id = %run_id, steps = steps.len(), tool_calls = tool_calls.len(), "Run completed");
        self.event_bus.publish(DomainEvent::RunCompleted {
            run_id: run_id.clone(),
            steps: steps.len(),
            tool_calls: tool_calls.len(),
            timestamp: Utc::now(),
        });

        Ok(RunResult {
            run_id,
            goal: request.goal.clone(),
            task_chain: request.task_chain.clone(),
            steps,
            tool_calls,
            memory: memory.clone(),
            result,
            persona_id: persona.id.clone(),
            persona_name: persona.name.clone(),
        })
    }
}
