//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{AgentError, ErrorDetails};

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for "[DONE]" or non-data lines.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> AgentError {
    match status {
        401 | 403 => AgentError::Authentication(error_message(body)),
        404 if body.contains("model_not_found") => AgentError::ModelNotFound(error_message(body)),
        429 => AgentError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => match ErrorDetails::from_body(body) {
            Some(details) => AgentError::api_with_details(status, error_message(body), details),
            None => AgentError::api(status, body),
        },
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sse_data_skips_done_and_comments() {
        assert_eq!(parse_sse_data("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(parse_sse_data("data:{}"), Some("{}"));
        assert_eq!(parse_sse_data("data: [DONE]"), None);
        assert_eq!(parse_sse_data(": keep-alive"), None);
    }

    #[test]
    fn status_to_error_maps_auth_and_rate_limit() {
        let err = status_to_error(401, r#"{"error":{"message":"Invalid API Key"}}"#);
        assert!(matches!(err, AgentError::Authentication(ref m) if m == "Invalid API Key"));

        let err = status_to_error(429, r#"{"error":{"retry_after":1.5}}"#);
        assert!(matches!(
            err,
            AgentError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }

    #[test]
    fn status_to_error_keeps_provider_details() {
        let body = r#"{"error":{"message":"bad tool","type":"invalid_request_error","code":"tool_use_failed"}}"#;
        match status_to_error(400, body) {
            AgentError::Api {
                status,
                message,
                details: Some(details),
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad tool");
                assert_eq!(details.code.as_deref(), Some("tool_use_failed"));
            }
            other => panic!("expected detailed API error, got {other:?}"),
        }
    }

    #[test]
    fn status_to_error_detects_missing_model() {
        let body = r#"{"error":{"message":"The model does not exist","code":"model_not_found"}}"#;
        assert!(matches!(status_to_error(404, body), AgentError::ModelNotFound(_)));
    }
}
