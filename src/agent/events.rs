//! Events emitted while an agent runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AgentToolCall, AgentToolResult, Usage};

/// Identifier of a single `Agent::run` invocation.
pub type RunId = Uuid;

/// Receiver for run events. Called synchronously from the run loop.
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    RunStarted {
        run_id: RunId,
        agent: String,
    },
    /// Response text; a streamed chunk, or the whole step when not streaming.
    TextDelta {
        run_id: RunId,
        text: String,
    },
    ToolCallStarted {
        run_id: RunId,
        call: AgentToolCall,
    },
    ToolCallCompleted {
        run_id: RunId,
        tool_name: String,
        result: AgentToolResult,
    },
    RunCompleted {
        run_id: RunId,
        usage: Usage,
    },
}

impl AgentEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::TextDelta { run_id, .. }
            | Self::ToolCallStarted { run_id, .. }
            | Self::ToolCallCompleted { run_id, .. }
            | Self::RunCompleted { run_id, .. } => *run_id,
        }
    }
}
