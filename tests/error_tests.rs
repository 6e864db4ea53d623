//! Error classification and the HTTP status mapping.

use agent_team::error::unified::*;
use agent_team::error::*;
use agent_team::provider::http::status_to_error;
use pretty_assertions::assert_eq;

#[test]
fn category_retry_and_recovery_by_variant() {
    struct Case {
        error: AgentError,
        category: ErrorCategory,
        retryable: bool,
        recovery: RecoverySuggestion,
    }

    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();
    let cases = vec![
        Case {
            error: AgentError::Authentication("Missing GROQ_API_KEY".into()),
            category: ErrorCategory::Authentication,
            retryable: false,
            recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: AgentError::RateLimited {
                retry_after_ms: None,
            },
            category: ErrorCategory::RateLimit,
            retryable: true,
            recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentError::Timeout(30_000),
            category: ErrorCategory::Timeout,
            retryable: true,
            recovery: RecoverySuggestion::IncreaseTimeout,
        },
        Case {
            error: AgentError::api(503, "over capacity"),
            category: ErrorCategory::Server,
            retryable: true,
            recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentError::api(400, "bad tool schema"),
            category: ErrorCategory::Api,
            retryable: false,
            recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentError::Serialization(serde_error),
            category: ErrorCategory::Serialization,
            retryable: false,
            recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentError::tool("get_current_stock_price", "no data for XXXX"),
            category: ErrorCategory::ToolExecution,
            retryable: false,
            recovery: RecoverySuggestion::CheckToolImplementation,
        },
        Case {
            error: AgentError::ModelNotFound("llama-3.1-70b-versatile".into()),
            category: ErrorCategory::Unknown,
            retryable: false,
            recovery: RecoverySuggestion::ContactSupport,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.category, "{}", case.error);
        assert_eq!(case.error.is_retryable(), case.retryable, "{}", case.error);
        assert_eq!(case.error.recovery_suggestion(), case.recovery, "{}", case.error);
    }
}

#[test]
fn display_messages_name_the_failure() {
    assert_eq!(
        AgentError::tool("duckduckgo_search", "HTTP 503").to_string(),
        "Tool execution error: duckduckgo_search: HTTP 503"
    );
    assert_eq!(
        AgentError::api(404, "Not found").to_string(),
        "API error (status 404): Not found"
    );
}

#[test]
fn server_errors_keep_groq_details() {
    let body = r#"{"error":{"message":"Service unavailable","type":"internal_server_error","code":"service_unavailable"}}"#;
    match status_to_error(503, body) {
        AgentError::Api {
            status,
            message,
            details,
        } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service unavailable");
            assert_eq!(
                details,
                Some(ErrorDetails {
                    error_type: Some("internal_server_error".into()),
                    code: Some("service_unavailable".into()),
                })
            );
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[test]
fn unstructured_bodies_are_kept_verbatim() {
    assert_eq!(ErrorDetails::from_body("<html>bad gateway</html>"), None);
    let err = status_to_error(502, "<html>bad gateway</html>");
    assert_eq!(err.to_string(), "API error (status 502): <html>bad gateway</html>");
    assert!(err.is_retryable());
}
