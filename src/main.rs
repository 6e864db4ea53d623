//! `agent-team` binary entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agent_team::cli::errors::format_error_help;
use agent_team::cli::{ChatArgs, Cli, Commands, RunArgs};
use agent_team::config::{service, AppConfig};
use agent_team::output::Console;
use agent_team::runner::run_script;
use agent_team::session::ChatSession;
use agent_team::shell::{render, Shell};
use agent_team::team::AgentFactory;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run(args) => handle_run(config, args).await,
        Commands::Chat(args) => handle_chat(config, args).await,
        Commands::Models => {
            if let Err(e) = render::render_models(&mut std::io::stdout()) {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

/// Logs go to stderr so they never mix with captured console output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn handle_run(config: AppConfig, args: RunArgs) -> ExitCode {
    let factory = AgentFactory::new(config);
    let console = Console::stdout();
    match run_script(&factory, args.model, &args.query, args.stream, &console).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", format_error_help(&e));
            ExitCode::FAILURE
        }
    }
}

async fn handle_chat(config: AppConfig, args: ChatArgs) -> ExitCode {
    if !config.has_credentials(service::GROQ) {
        eprintln!("Warning: GROQ_API_KEY is not set; queries will fail until it is.");
    }
    let session = ChatSession::new(AgentFactory::new(config), Console::stdout())
        .with_stream(!args.no_stream);
    let mut shell = Shell::new(session);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    match shell.run(input).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
