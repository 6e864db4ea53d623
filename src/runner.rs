//! One-shot finance query.

use thiserror::Error;

use crate::error::AgentError;
use crate::models::GroqModel;
use crate::output::Console;
use crate::team::{AgentFactory, ConstructionError};

pub const DEFAULT_SCRIPT_MODEL: GroqModel = GroqModel::Llama3370bVersatile;
pub const DEFAULT_SCRIPT_QUERY: &str =
    "Summarize and compare analyst recommendations and fundamentals for TESLA and NVIDIA";

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl RunError {
    /// The underlying agent-layer error.
    pub fn agent_error(&self) -> &AgentError {
        match self {
            Self::Agent(e) => e,
            Self::Construction(e) => construction_source(e),
        }
    }
}

fn construction_source(err: &ConstructionError) -> &AgentError {
    match err {
        ConstructionError::Agent { source, .. } => source,
        ConstructionError::Team(inner) => construction_source(inner),
    }
}

/// Build the finance agent and print its answer to `query` on `console`.
///
/// Unlike the chat shell nothing is caught here: any failure is returned.
pub async fn run_script(
    factory: &AgentFactory,
    model: GroqModel,
    query: &str,
    stream: bool,
    console: &Console,
) -> Result<String, RunError> {
    let agent = factory.create_script_agent(model)?;
    tracing::info!(model = %model, "running one-shot query");
    Ok(agent.print_response(query, stream, console).await?)
}
