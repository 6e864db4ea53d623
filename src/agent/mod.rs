//! Agents: a model, a tool set and instructions, optionally leading a team.

pub mod agent;
pub mod delegate;
pub mod events;
mod prompt;

pub use agent::{format_tool_call, Agent, AgentSettings, RunOutput};
pub use delegate::transfer_tool_name;
pub use events::{AgentEvent, AgentEventSink, RunId};
