//! OpenAI-compatible Chat Completions transport.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::AgentError;
use crate::models::ModelCapabilities;
use crate::types::*;

use super::format::tool_result_to_string;
use super::http::{bearer_headers, parse_sse_data, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

/// Chat Completions client for one model on one OpenAI-compatible endpoint.
pub struct ChatCompletionsProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    capabilities: ModelCapabilities,
}

impl ChatCompletionsProvider {
    pub fn new(
        model_id: impl Into<String>,
        capabilities: ModelCapabilities,
        api_key: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            capabilities,
        }
    }

    fn build_request_body(&self, request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model_id.clone().into());
        body.insert("messages".into(), messages.into());
        body.insert("stream".into(), stream.into());

        if let Some(max) = request.settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            body.insert("stop".into(), serde_json::json!(stops));
        }
        if let Some(seed) = request.settings.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = request.settings.user {
            body.insert("user".into(), user.clone().into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                body.insert("tools".into(), tool_defs.into());
                body.insert("tool_choice".into(), "auto".into());
            }
        }

        serde_json::Value::Object(body)
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, AgentError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ModelProvider for ChatCompletionsProvider {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn capabilities(&self) -> &ModelCapabilities {
        &self.capabilities
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        let body = self.build_request_body(request, false);
        debug!(model = %self.model_id, "chat completion");

        let data: ChatResponse = self.post(&body).await?.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::api(200, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: parse_arguments(tc.function.arguments),
            })
            .collect();

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data.usage.map(Usage::from).unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
        })
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, AgentError>>, AgentError> {
        let body = self.build_request_body(request, true);
        debug!(model = %self.model_id, "chat completion stream");

        let byte_stream = self.post(&body).await?.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AgentError::Network(e));
                        return;
                    }
                };
                for delta in decoder.feed(&chunk) {
                    yield Ok(delta);
                }
            }
            for delta in decoder.finish() {
                yield Ok(delta);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Incremental decoder from SSE bytes to stream deltas.
///
/// Input is buffered as bytes and only complete lines are decoded, so a
/// multi-byte character split across network chunks survives. Tool call fragments arrive spread over many chunks keyed by `index`; they
/// are held back and emitted whole once the model signals completion.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending_calls: BTreeMap<usize, PartialToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    done: bool,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl SseDecoder {
    /// Feed raw bytes; returns the deltas completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<TextStreamDelta> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if line == "data: [DONE]" || line == "data:[DONE]" {
                out.extend(self.finish());
                continue;
            }
            let Some(data) = parse_sse_data(line) else {
                continue;
            };
            match serde_json::from_str::<StreamChunk>(data) {
                Ok(chunk) => self.apply_chunk(chunk, &mut out),
                Err(e) => debug!(error = %e, "skipping unparseable stream chunk"),
            }
        }
        out
    }

    /// Flush held tool calls and emit the final `Done` delta (once).
    pub fn finish(&mut self) -> Vec<TextStreamDelta> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        let mut out: Vec<TextStreamDelta> = std::mem::take(&mut self.pending_calls)
            .into_values()
            .map(|call| {
                TextStreamDelta::tool_call(AgentToolCall {
                    id: call.id,
                    name: call.name,
                    arguments: parse_arguments(call.arguments),
                })
            })
            .collect();
        out.push(TextStreamDelta::done(self.finish_reason, self.usage.take()));
        out
    }

    fn apply_chunk(&mut self, chunk: StreamChunk, out: &mut Vec<TextStreamDelta>) {
        if let Some(usage) = chunk.usage.or_else(|| chunk.x_groq.and_then(|x| x.usage)) {
            self.usage = Some(usage.into());
        }
        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                out.push(TextStreamDelta::text(content));
            }
        }
        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let entry = self.pending_calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id {
                entry.id = id;
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    entry.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }
        if let Some(reason) = choice.finish_reason.as_deref().and_then(parse_finish_reason) {
            self.finish_reason = Some(reason);
        }
    }
}

fn parse_arguments(raw: String) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    if let Some(ContentPart::ToolResult(tr)) = msg.content.first() {
        return serde_json::json!({
            "role": "tool",
            "tool_call_id": tr.tool_call_id,
            "content": tool_result_to_string(&tr.result),
        });
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments.to_string(),
                    }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

// Chat Completions wire types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<WireUsage> for Usage {
    fn from(u: WireUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<WireUsage>,
    x_groq: Option<XGroq>,
}

#[derive(Deserialize)]
struct XGroq {
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Deserialize)]
struct StreamToolCall {
    index: usize,
    id: Option<String>,
    function: Option<StreamFunction>,
}

#[derive(Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(deltas: &[TextStreamDelta]) -> Vec<&str> {
        deltas
            .iter()
            .filter(|d| d.event_type == StreamEventType::TextDelta)
            .map(|d| d.text.as_str())
            .collect()
    }

    #[test]
    fn decoder_handles_lines_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        let first = decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel");
        assert!(first.is_empty());
        let second = decoder.feed(b"lo\"},\"finish_reason\":null}]}\n\n");
        assert_eq!(texts(&second), vec!["Hello"]);
    }

    #[test]
    fn decoder_keeps_multibyte_characters_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"Price: \u{20ac}42\"}}]}\n".as_bytes();
        let euro = line.windows(3).position(|w| w == "\u{20ac}".as_bytes()).unwrap();
        let mut decoder = SseDecoder::default();

        let first = decoder.feed(&line[..euro + 1]);
        let second = decoder.feed(&line[euro + 1..]);

        assert!(first.is_empty());
        assert_eq!(texts(&second), vec!["Price: \u{20ac}42"]);
    }

    #[test]
    fn decoder_assembles_tool_calls_before_done() {
        let mut decoder = SseDecoder::default();
        let mut all = Vec::new();
        all.extend(decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"get_current_stock_price\",\"arguments\":\"{\\\"sym\"}}]}}]}\n",
        ));
        all.extend(decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"bol\\\":\\\"NVDA\\\"}\"}}]},\"finish_reason\":\"tool_calls\"}]}\n",
        ));
        all.extend(decoder.feed(b"data: [DONE]\n"));
        all.extend(decoder.finish());

        assert_eq!(all.len(), 2);
        let call = all[0].tool_call.as_ref().unwrap();
        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "get_current_stock_price");
        assert_eq!(call.arguments, serde_json::json!({"symbol": "NVDA"}));
        assert_eq!(all[1].event_type, StreamEventType::Done);
        assert_eq!(all[1].finish_reason, Some(FinishReason::ToolCalls));
    }

    #[test]
    fn decoder_reads_groq_usage_extension() {
        let mut decoder = SseDecoder::default();
        decoder.feed(
            b"data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}],\"x_groq\":{\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":4,\"total_tokens\":7}}}\n",
        );
        let done = decoder.finish();
        assert_eq!(done[0].usage.as_ref().unwrap().total_tokens, 7);
    }

    #[test]
    fn tool_messages_are_flattened_for_the_wire() {
        let msg = ModelMessage::tool_result("call_9", serde_json::json!({"price": 1.5}), false);
        let wire = message_to_openai(&msg);
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_9");
        assert_eq!(wire["content"], "{\"price\":1.5}");
    }

    #[test]
    fn assistant_tool_call_messages_carry_string_arguments() {
        let call = AgentToolCall {
            id: "c1".into(),
            name: "duckduckgo_search".into(),
            arguments: serde_json::json!({"query": "rust"}),
        };
        let wire = message_to_openai(&ModelMessage::assistant_tool_calls("", &[call]));
        assert_eq!(wire["content"], serde_json::Value::Null);
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], "{\"query\":\"rust\"}");
    }

    #[test]
    fn empty_arguments_become_empty_object() {
        assert_eq!(parse_arguments(String::new()), serde_json::json!({}));
        assert_eq!(
            parse_arguments("not json".into()),
            serde_json::Value::String("not json".into())
        );
    }
}
