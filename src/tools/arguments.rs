//! Typed access to tool call arguments.
//!
//! Llama models on Groq are loose with JSON types: numbers often arrive as
//! strings and the whole argument object sometimes arrives as one encoded
//! string. Accessors here accept both forms.

use serde_json::Value;

use crate::error::AgentError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        let value = match value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(trimmed).unwrap_or(Value::String(raw))
                }
            }
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Get a required string argument.
    pub fn get_str(&self, key: &str) -> Result<&str, AgentError> {
        self.get_str_opt(key)
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional, non-blank string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Get an unsigned integer, accepting numeric strings; `default` when absent.
    pub fn get_u64_or(&self, key: &str, default: u64) -> Result<u64, AgentError> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or_else(|| AgentError::InvalidArgument(format!("{key} must be non-negative"))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| AgentError::InvalidArgument(format!("{key} is not a number: {s}"))),
            Some(other) => Err(AgentError::InvalidArgument(format!(
                "{key} has unexpected type: {other}"
            ))),
        }
    }

    /// Get a ticker symbol, trimmed and upper-cased.
    pub fn get_symbol(&self, key: &str) -> Result<String, AgentError> {
        let symbol = self.get_str(key)?.trim().to_ascii_uppercase();
        if symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            Ok(symbol)
        } else {
            Err(AgentError::InvalidArgument(format!("invalid ticker symbol: {symbol}")))
        }
    }
}
