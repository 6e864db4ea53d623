//! Agent configuration and the tool-calling run loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::delegate::DelegateTool;
use super::events::{AgentEvent, AgentEventSink, RunId};
use super::prompt::build_system_prompt;
use crate::config::AgentDefaults;
use crate::error::AgentError;
use crate::models::{GroqModel, Temperature};
use crate::output::Console;
use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse, ToolDefinition};
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, Toolkit};
use crate::types::*;
use crate::util::retry::RetryPolicy;

/// Maximum model round-trips per run.
const MAX_TOOL_ITERATIONS: usize = 10;

/// Model parameters for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: GroqModel,
    pub temperature: Temperature,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
}

impl AgentSettings {
    pub fn from_defaults(defaults: &AgentDefaults) -> Self {
        Self {
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            retry: RetryPolicy::from_flag(defaults.retry_on_error, defaults.retry_count),
        }
    }

    pub fn with_model(mut self, model: GroqModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn generation(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .max_tokens(self.max_tokens)
            .temperature(self.temperature.value())
            .build()
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_defaults(&AgentDefaults::default())
    }
}

/// Result of [`Agent::run`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run_id: RunId,
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub usage: Usage,
    pub iterations: usize,
}

/// A model endpoint plus tools, instructions and optional team members.
///
/// Agents are cheap to clone; the provider and tools are shared.
#[derive(Clone)]
pub struct Agent {
    name: String,
    role: Option<String>,
    provider: Arc<dyn ModelProvider>,
    settings: AgentSettings,
    tools: Vec<Arc<dyn Tool>>,
    instructions: Vec<String>,
    show_tool_calls: bool,
    markdown: bool,
    team: Vec<Agent>,
}

impl Agent {
    /// `provider` must serve `settings.model`.
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            name: name.into(),
            role: None,
            provider,
            settings,
            tools: Vec::new(),
            instructions: Vec::new(),
            show_tool_calls: false,
            markdown: false,
            team: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Attach every enabled tool of a toolkit.
    pub fn with_toolkit(mut self, toolkit: &dyn Toolkit) -> Self {
        self.tools.extend(toolkit.tools());
        self
    }

    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn show_tool_calls(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    /// Members become reachable through `transfer_task_to_*` tools.
    pub fn with_team(mut self, team: Vec<Agent>) -> Self {
        self.team = team;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn model(&self) -> GroqModel {
        self.settings.model
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn team(&self) -> &[Agent] {
        &self.team
    }

    pub fn markdown(&self) -> bool {
        self.markdown
    }

    pub fn shows_tool_calls(&self) -> bool {
        self.show_tool_calls
    }

    /// Names of the agent's own tools, excluding delegation tools.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn system_prompt(&self) -> String {
        build_system_prompt(self)
    }

    fn all_tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools = self.tools.clone();
        tools.extend(
            self.team
                .iter()
                .map(|member| Arc::new(DelegateTool::new(member.clone())) as Arc<dyn Tool>),
        );
        tools
    }

    /// Answer `query`, executing tool calls until the model produces a final
    /// response or the iteration limit is reached.
    pub async fn run(
        &self,
        query: &str,
        stream: bool,
        sink: Option<&AgentEventSink>,
    ) -> Result<RunOutput, AgentError> {
        let run_id = Uuid::new_v4();
        let emit = |event: AgentEvent| {
            if let Some(sink) = sink {
                sink(event);
            }
        };
        emit(AgentEvent::RunStarted {
            run_id,
            agent: self.name.clone(),
        });

        let tools = self.all_tools();
        let tool_defs: Option<Vec<ToolDefinition>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(|t| t.definition()).collect())
        };
        let ctx = ToolExecutionContext {
            agent_name: Some(self.name.clone()),
        };

        let mut messages = vec![
            ModelMessage::system(self.system_prompt()),
            ModelMessage::user(query),
        ];
        let mut usage = Usage::default();
        let mut all_calls = Vec::new();
        let mut last_text = String::new();

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let request = ProviderRequest {
                messages: messages.clone(),
                settings: self.settings.generation(),
                tools: tool_defs.clone(),
            };
            debug!(
                agent = %self.name,
                model = self.provider.model_id(),
                iteration,
                stream,
                "calling model"
            );

            let response = if stream {
                self.stream_step(&request, run_id, &emit).await?
            } else {
                let response = self
                    .settings
                    .retry
                    .execute(|| self.provider.generate_text(&request))
                    .await?;
                if !response.text.is_empty() {
                    emit(AgentEvent::TextDelta {
                        run_id,
                        text: response.text.clone(),
                    });
                }
                response
            };
            usage.merge(&response.usage);
            last_text = response.text.clone();

            if response.tool_calls.is_empty() {
                emit(AgentEvent::RunCompleted {
                    run_id,
                    usage: usage.clone(),
                });
                return Ok(RunOutput {
                    run_id,
                    text: response.text,
                    tool_calls: all_calls,
                    usage,
                    iterations: iteration + 1,
                });
            }

            messages.push(ModelMessage::assistant_tool_calls(
                response.text.clone(),
                &response.tool_calls,
            ));
            for call in &response.tool_calls {
                emit(AgentEvent::ToolCallStarted {
                    run_id,
                    call: call.clone(),
                });
                let result = execute_tool(&tools, call, &ctx).await;
                emit(AgentEvent::ToolCallCompleted {
                    run_id,
                    tool_name: call.name.clone(),
                    result: result.clone(),
                });
                messages.push(ModelMessage::tool_result(
                    result.tool_call_id,
                    result.result,
                    result.is_error,
                ));
            }
            all_calls.extend(response.tool_calls);
        }

        warn!(agent = %self.name, "tool loop hit {MAX_TOOL_ITERATIONS} iterations");
        emit(AgentEvent::RunCompleted {
            run_id,
            usage: usage.clone(),
        });
        Ok(RunOutput {
            run_id,
            text: last_text,
            tool_calls: all_calls,
            usage,
            iterations: MAX_TOOL_ITERATIONS,
        })
    }

    /// One streamed model call, assembled into a response.
    ///
    /// Only opening the stream is retried; a failure mid-stream ends the run.
    async fn stream_step(
        &self,
        request: &ProviderRequest,
        run_id: RunId,
        emit: &(dyn Fn(AgentEvent) + Sync),
    ) -> Result<ProviderResponse, AgentError> {
        let mut stream = self
            .settings
            .retry
            .execute(|| self.provider.stream_text(request))
            .await?;

        let mut response = ProviderResponse {
            text: String::new(),
            usage: Usage::default(),
            tool_calls: Vec::new(),
            finish_reason: None,
        };
        while let Some(delta) = stream.next().await {
            let delta = delta?;
            match delta.event_type {
                StreamEventType::TextDelta => {
                    if !delta.text.is_empty() {
                        response.text.push_str(&delta.text);
                        emit(AgentEvent::TextDelta {
                            run_id,
                            text: delta.text,
                        });
                    }
                }
                StreamEventType::ToolCallDelta => {
                    if let Some(call) = delta.tool_call {
                        response.tool_calls.push(call);
                    }
                }
                StreamEventType::Done => {
                    if let Some(usage) = delta.usage {
                        response.usage = usage;
                    }
                    response.finish_reason = delta.finish_reason;
                }
            }
        }
        Ok(response)
    }

    /// Run `query` and write the tool-call trace and response text to
    /// `console` as they are produced. Returns the final response text.
    pub async fn print_response(
        &self,
        query: &str,
        stream: bool,
        console: &Console,
    ) -> Result<String, AgentError> {
        let sink = trace_sink(console.clone(), self.show_tool_calls);
        let output = self.run(query, stream, Some(&sink)).await?;
        console.write("\n");
        console.flush();
        Ok(output.text)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.settings.model)
            .field("tools", &self.tool_names())
            .field("team", &self.team.iter().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}

async fn execute_tool(
    tools: &[Arc<dyn Tool>],
    call: &AgentToolCall,
    ctx: &ToolExecutionContext,
) -> AgentToolResult {
    let Some(tool) = tools.iter().find(|t| t.name() == call.name) else {
        warn!(tool = %call.name, "model called an unknown tool");
        return AgentToolResult {
            tool_call_id: call.id.clone(),
            result: serde_json::json!({ "error": format!("Tool '{}' not found", call.name) }),
            is_error: true,
        };
    };

    let args = ToolArguments::new(call.arguments.clone());
    match tool.execute(&args, ctx).await {
        Ok(result) => AgentToolResult {
            tool_call_id: call.id.clone(),
            result,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = %call.name, error = %e, "tool execution failed");
            AgentToolResult {
                tool_call_id: call.id.clone(),
                result: serde_json::json!({ "error": e.to_string() }),
                is_error: true,
            }
        }
    }
}

/// Sink rendering run events as console text.
fn trace_sink(console: Console, show_tool_calls: bool) -> AgentEventSink {
    let in_tool_block = AtomicBool::new(false);
    Arc::new(move |event: AgentEvent| match event {
        AgentEvent::ToolCallStarted { call, .. } if show_tool_calls => {
            if !in_tool_block.swap(true, Ordering::Relaxed) {
                console.writeln("Running:");
            }
            console.writeln(&format!(" - {}", format_tool_call(&call)));
        }
        AgentEvent::TextDelta { text, .. } => {
            if in_tool_block.swap(false, Ordering::Relaxed) {
                console.write("\n");
            }
            console.write(&text);
        }
        _ => {}
    })
}

/// `name(key=value, ...)` as shown in the tool trace.
pub fn format_tool_call(call: &AgentToolCall) -> String {
    let args = ToolArguments::new(call.arguments.clone());
    let rendered = match args.raw() {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    format!("{}({rendered})", call.name)
}
