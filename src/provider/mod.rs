//! Model provider trait and the Groq transport.

pub mod format;
pub mod groq;
pub mod http;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::{service, AppConfig};
use crate::error::AgentError;
use crate::models::{GroqModel, ModelCapabilities};
use crate::types::{message::AgentToolCall, FinishReason, GenerationSettings, ModelMessage, TextStreamDelta, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "groq").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Capabilities of the model.
    fn capabilities(&self) -> &ModelCapabilities;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, AgentError>;

    /// Generate text (streaming).
    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, AgentError>>, AgentError>;
}

/// Create a Groq provider for the given model.
///
/// Fails with an authentication error when no API key is configured.
pub fn create_provider(
    model: GroqModel,
    config: &AppConfig,
) -> Result<Arc<dyn ModelProvider>, AgentError> {
    let api_key = config
        .get_api_key(service::GROQ)
        .ok_or_else(|| AgentError::Authentication("Missing GROQ_API_KEY".into()))?;
    Ok(Arc::new(groq::GroqProvider::new(
        model,
        api_key,
        config.get_base_url(service::GROQ),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_requires_api_key() {
        let config = AppConfig::new();
        let err = create_provider(GroqModel::Llama3370bVersatile, &config)
            .err()
            .expect("missing key should fail");
        assert!(matches!(err, AgentError::Authentication(_)));
    }

    #[test]
    fn create_provider_succeeds_for_every_allowed_model() {
        let config = AppConfig::new();
        config.set_api_key(service::GROQ, "test-key".into());
        for model in GroqModel::all() {
            let provider = create_provider(model, &config).unwrap();
            assert_eq!(provider.model_id(), model.as_str());
            assert_eq!(provider.provider_name(), "groq");
        }
    }
}
