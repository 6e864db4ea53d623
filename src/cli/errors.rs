//! User-facing error help for the command line.

use crate::error::{AgentError, ErrorCategory, RecoverySuggestion};
use crate::runner::RunError;

/// Map a failed run to a message with actionable guidance.
pub fn format_error_help(err: &RunError) -> String {
    let headline = err.to_string();
    match hint(err.agent_error()) {
        Some(hint) => format!("{headline}\n{hint}"),
        None => headline,
    }
}

fn hint(error: &AgentError) -> Option<&'static str> {
    if let AgentError::ModelNotFound(_) = error {
        return Some("The model may be retired on Groq. Run `agent-team models` and pick another.");
    }
    match error.recovery_suggestion() {
        RecoverySuggestion::CheckCredentials => {
            Some("Set GROQ_API_KEY in the environment or in a .env file.")
        }
        RecoverySuggestion::RetryWithBackoff if error.category() == ErrorCategory::RateLimit => {
            Some("Groq rate limit reached. Wait a moment or pick a smaller model with --model.")
        }
        RecoverySuggestion::RetryWithBackoff | RecoverySuggestion::IncreaseTimeout => {
            Some("Check your network connection and GROQ_BASE_URL, then try again.")
        }
        RecoverySuggestion::CheckConfiguration => Some("Check the config file passed with --config."),
        RecoverySuggestion::CheckToolImplementation => {
            Some("A DuckDuckGo or Yahoo Finance lookup failed. Check that the service is reachable.")
        }
        RecoverySuggestion::ContactSupport => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroqModel;
    use crate::team::{AgentKind, ConstructionError};

    #[test]
    fn missing_key_points_at_env_var() {
        let err = RunError::Construction(ConstructionError::Agent {
            kind: AgentKind::Finance,
            model: GroqModel::Llama3370bVersatile,
            source: AgentError::Authentication("Missing GROQ_API_KEY".into()),
        });
        let help = format_error_help(&err);
        assert!(help.contains("llama-3.3-70b-versatile"));
        assert!(help.contains("GROQ_API_KEY in the environment"));
    }

    #[test]
    fn rate_limit_suggests_waiting() {
        let err = RunError::Agent(AgentError::RateLimited {
            retry_after_ms: Some(1000),
        });
        assert!(format_error_help(&err).contains("rate limit"));
    }

    #[test]
    fn server_errors_suggest_trying_again() {
        let err = RunError::Agent(AgentError::api(503, "Service unavailable"));
        let help = format_error_help(&err);
        assert!(help.starts_with("API error (status 503)"));
        assert!(help.ends_with("GROQ_BASE_URL, then try again."));
    }

    #[test]
    fn forbidden_status_is_a_credentials_problem() {
        let err = RunError::Agent(AgentError::api(403, "forbidden"));
        assert!(format_error_help(&err).contains("GROQ_API_KEY"));
    }

    #[test]
    fn tool_failures_name_the_lookup_services() {
        let err = RunError::Agent(AgentError::tool("get_company_news", "connection refused"));
        assert!(format_error_help(&err).contains("Yahoo Finance"));
    }

    #[test]
    fn other_errors_fall_through_to_display() {
        let err = RunError::Agent(AgentError::InvalidState("stream ended early".into()));
        assert_eq!(format_error_help(&err), err.to_string());
    }
}
