//! Groq provider (OpenAI-compatible).

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::AgentError;
use crate::models::{GroqModel, ModelCapabilities};
use crate::types::TextStreamDelta;

use super::openai::ChatCompletionsProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    inner: ChatCompletionsProvider,
}

impl GroqProvider {
    pub fn new(model: GroqModel, api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: ChatCompletionsProvider::new(
                model.as_str(),
                model.capabilities(),
                api_key,
                base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string()),
            ),
        }
    }
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn provider_name(&self) -> &str {
        "groq"
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn capabilities(&self) -> &ModelCapabilities {
        self.inner.capabilities()
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        self.inner.generate_text(request).await
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, AgentError>>, AgentError> {
        self.inner.stream_text(request).await
    }
}
