//! System prompt assembly.

use std::fmt::Write;

use super::agent::Agent;
use super::delegate::transfer_tool_name;

const TEAM_LEADER_PREAMBLE: &str = "\
You are the leader of a team of AI Agents.
- You can either respond directly or transfer tasks to other Agents in your team depending on the tools available to them.
- If you transfer a task to another Agent, make sure to include a clear description of the task and the expected output.
- You must always validate the output of the other Agents before responding to the user. You can re-assign the task if you are not satisfied with the result.";

pub(crate) fn build_system_prompt(agent: &Agent) -> String {
    let mut prompt = String::new();

    if !agent.team().is_empty() {
        prompt.push_str(TEAM_LEADER_PREAMBLE);
        prompt.push_str("\n\n<team_members>\n");
        for member in agent.team() {
            let _ = writeln!(prompt, "Agent: {}", member.name());
            if let Some(role) = member.role() {
                let _ = writeln!(prompt, "Role: {role}");
            }
            let tools = member.tool_names();
            if !tools.is_empty() {
                let _ = writeln!(prompt, "Available tools: {}", tools.join(", "));
            }
            let _ = writeln!(prompt, "Transfer with: {}", transfer_tool_name(member.name()));
            prompt.push('\n');
        }
        prompt.push_str("</team_members>\n\n");
    }

    if let Some(role) = agent.role() {
        let _ = write!(prompt, "<your_role>\n{role}\n</your_role>\n\n");
    }

    let mut instructions: Vec<&str> = agent.instructions().iter().map(String::as_str).collect();
    if agent.markdown() {
        instructions.push("Use markdown to format your answers.");
    }
    if !instructions.is_empty() {
        prompt.push_str("## Instructions\n");
        for (i, instruction) in instructions.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {instruction}", i + 1);
        }
    }

    prompt.trim_end().to_string()
}
