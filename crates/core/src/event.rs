//! Domain event system: decoupled observation of runs.
//!
//! The orchestrator publishes events as a run progresses. Subscribers (the
//! CLI's verbose mode, tests) react without coupling to the agent crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A run was accepted and is about to execute its first step
    RunStarted {
        run_id: String,
        user_id: String,
        persona: String,
        steps: usize,
        timestamp: DateTime<Utc>,
    },

    /// One sub-goal finished
    StepCompleted {
        run_id: String,
        index: usize,
        sub_goal: String,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A remember directive wrote a memory entry
    MemoryWritten {
        user_id: String,
        key: String,
        timestamp: DateTime<Utc>,
    },

    /// The run finished all steps
    RunCompleted {
        run_id: String,
        steps: usize,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// The run aborted on a fatal error
    RunFailed {
        run_id: String,
        step: usize,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
