//! Shared test helpers: a scripted model provider and factories using it.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;

use agent_team::config::AppConfig;
use agent_team::error::AgentError;
use agent_team::models::{GroqModel, ModelCapabilities};
use agent_team::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use agent_team::team::{AgentFactory, ProviderResolver};
use agent_team::types::*;

/// One scripted model turn.
pub enum Step {
    Text(String),
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    Fail(AgentError),
    /// Never answers.
    Hang,
}

/// Provider replaying scripted steps in order and recording every request.
///
/// An exhausted script answers "Mock response".
pub struct ScriptedProvider {
    model_id: String,
    capabilities: ModelCapabilities,
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(model: GroqModel) -> Self {
        Self {
            model_id: model.as_str().to_string(),
            capabilities: model.capabilities(),
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Step::Text(text.to_string()))
    }

    pub fn tool_call(self, id: &str, name: &str, arguments: serde_json::Value) -> Self {
        self.push(Step::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        })
    }

    pub fn fail(self, error: AgentError) -> Self {
        self.push(Step::Fail(error))
    }

    pub fn hang(self) -> Self {
        self.push(Step::Hang)
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.lock().unwrap().len()
    }

    fn next_step(&self, request: &ProviderRequest) -> Step {
        self.requests.lock().unwrap().push(request.clone());
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Text("Mock response".to_string()))
    }
}

fn usage() -> Usage {
    Usage {
        input_tokens: 10,
        output_tokens: 20,
        total_tokens: 30,
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        match self.next_step(request) {
            Step::Text(text) => Ok(ProviderResponse {
                text,
                usage: usage(),
                tool_calls: vec![],
                finish_reason: Some(FinishReason::Stop),
            }),
            Step::ToolCall {
                id,
                name,
                arguments,
            } => Ok(ProviderResponse {
                text: String::new(),
                usage: usage(),
                tool_calls: vec![AgentToolCall {
                    id,
                    name,
                    arguments,
                }],
                finish_reason: Some(FinishReason::ToolCalls),
            }),
            Step::Fail(error) => Err(error),
            Step::Hang => futures::future::pending().await,
        }
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, AgentError>>, AgentError> {
        let step = self.next_step(request);
        let stream = async_stream::stream! {
            match step {
                Step::Text(text) => {
                    for chunk in text.chars().collect::<Vec<_>>().chunks(5) {
                        yield Ok(TextStreamDelta::text(chunk.iter().collect::<String>()));
                    }
                    yield Ok(TextStreamDelta::done(Some(FinishReason::Stop), Some(usage())));
                }
                Step::ToolCall { id, name, arguments } => {
                    yield Ok(TextStreamDelta::tool_call(AgentToolCall { id, name, arguments }));
                    yield Ok(TextStreamDelta::done(Some(FinishReason::ToolCalls), Some(usage())));
                }
                Step::Fail(error) => yield Err(error),
                Step::Hang => futures::future::pending::<()>().await,
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Resolver handing out the same provider for every model.
pub fn shared_resolver(provider: Arc<ScriptedProvider>) -> ProviderResolver {
    Arc::new(move |_model: GroqModel| -> Result<Arc<dyn ModelProvider>, AgentError> {
        Ok(provider.clone())
    })
}

/// Factory whose agents all talk to `provider`. Tool base URLs point at an
/// unroutable address so an unscripted tool call fails fast.
pub fn scripted_factory(provider: Arc<ScriptedProvider>) -> AgentFactory {
    AgentFactory::with_resolver(offline_config(), shared_resolver(provider))
}

pub fn offline_config() -> AppConfig {
    use agent_team::config::service;

    let config = AppConfig::new();
    config.set_base_url(service::DUCKDUCKGO, "http://127.0.0.1:9".into());
    config.set_base_url(service::YFINANCE_QUERY, "http://127.0.0.1:9".into());
    config.set_base_url(service::YFINANCE_COOKIE, "http://127.0.0.1:9".into());
    config
}
