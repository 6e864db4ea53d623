//! Building the three-role agent team and sending queries to it.

pub mod dispatch;
pub mod factory;

use thiserror::Error;

use crate::error::AgentError;
use crate::models::GroqModel;

pub use dispatch::dispatch_query;
pub use factory::{AgentFactory, AgentKind, ProviderResolver};

/// An agent or team could not be built. The query is never attempted.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("Error creating {} with model {model}: {source}", .kind.label())]
    Agent {
        kind: AgentKind,
        model: GroqModel,
        #[source]
        source: AgentError,
    },
    #[error("Error creating agent team: {0}")]
    Team(#[source] Box<ConstructionError>),
}

/// A query failed while running.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("Error processing query: {0}")]
    Agent(#[from] AgentError),
}
