//! Command-line interface.

pub mod errors;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::GroqModel;
use crate::runner::{DEFAULT_SCRIPT_MODEL, DEFAULT_SCRIPT_QUERY};

/// Groq-backed agent team: one-shot finance query or interactive chat.
#[derive(Parser, Debug)]
#[command(name = "agent-team", version, about)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the finance agent one question and print the answer
    Run(RunArgs),
    /// Chat with the web / finance agent team
    Chat(ChatArgs),
    /// List the models that can be selected
    Models,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model id from the allow-list
    #[arg(short, long, default_value_t = DEFAULT_SCRIPT_MODEL)]
    pub model: GroqModel,

    /// Stream the response as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Question to ask
    #[arg(default_value = DEFAULT_SCRIPT_QUERY)]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Print responses only once complete
    #[arg(long)]
    pub no_stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_defaults() {
        let cli = Cli::try_parse_from(["agent-team", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.model, GroqModel::Llama3370bVersatile);
                assert_eq!(args.query, DEFAULT_SCRIPT_QUERY);
                assert!(!args.stream);
            }
            other => panic!("expected Run, got {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "agent-team",
            "--config",
            "/tmp/agent.toml",
            "run",
            "-m",
            "llama-3.2-3b-preview",
            "--stream",
            "How is AAPL doing?",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/agent.toml")));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.model, GroqModel::Llama323bPreview);
                assert!(args.stream);
                assert_eq!(args.query, "How is AAPL doing?");
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn parse_run_rejects_unknown_model() {
        assert!(Cli::try_parse_from(["agent-team", "run", "-m", "gpt-4o"]).is_err());
    }

    #[test]
    fn parse_chat_and_models() {
        let cli = Cli::try_parse_from(["agent-team", "chat", "--no-stream"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat(ChatArgs { no_stream: true })));
        let cli = Cli::try_parse_from(["agent-team", "models"]).unwrap();
        assert!(matches!(cli.command, Commands::Models));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["agent-team"]).is_err());
    }
}
