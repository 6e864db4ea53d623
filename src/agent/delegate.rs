//! Team delegation exposed to the coordinator as ordinary tools.

use async_trait::async_trait;
use serde_json::Value;

use super::agent::Agent;
use crate::error::AgentError;
use crate::tools::{AgentToolParameters, Tool, ToolArguments, ToolExecutionContext};

/// Name of the tool a coordinator calls to hand work to `agent_name`.
pub fn transfer_tool_name(agent_name: &str) -> String {
    format!("transfer_task_to_{}", snake_case(agent_name))
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Runs a team member's own tool loop and returns its final answer.
pub(crate) struct DelegateTool {
    member: Agent,
    name: String,
    description: String,
    parameters: AgentToolParameters,
}

impl DelegateTool {
    pub(crate) fn new(member: Agent) -> Self {
        let mut description = format!("Use this function to transfer a task to {}.", member.name());
        if let Some(role) = member.role() {
            description.push_str(&format!(" Their role is: {role}."));
        }
        description.push_str(
            " You must provide a clear and concise description of the task the agent should achieve AND the expected output.",
        );
        Self {
            name: transfer_tool_name(member.name()),
            description,
            parameters: AgentToolParameters::object()
                .string(
                    "task_description",
                    "A clear and concise description of the task the agent should achieve.",
                    true,
                )
                .string(
                    "expected_output",
                    "The expected output from the agent.",
                    false,
                )
                .build(),
            member,
        }
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, AgentError> {
        let task = args.get_str("task_description")?;
        let mut message = task.to_string();
        if let Some(expected) = args.get_str_opt("expected_output") {
            message.push_str("\n\nThe expected output is: ");
            message.push_str(expected);
        }

        tracing::info!(
            from = ctx.agent_name.as_deref().unwrap_or("coordinator"),
            to = self.member.name(),
            "transferring task"
        );
        let output = self.member.run(&message, false, None).await?;
        Ok(Value::String(output.text))
    }
}
