//! Groq-backed agent team.
//!
//! Two front-ends share one agent layer:
//!
//! - [`runner::run_script`] asks a finance agent a single question and prints
//!   the answer;
//! - [`shell::Shell`] is an interactive chat over a team of a web-search
//!   agent, a finance-data agent and a coordinator delegating to both.
//!
//! ```no_run
//! use agent_team::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let factory = AgentFactory::new(AppConfig::load(None)?);
//! let mut session = ChatSession::new(factory, Console::stdout());
//! let reply = session.submit("How is NVDA trading today?", None).await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod prelude;
pub mod provider;
pub mod runner;
pub mod session;
pub mod shell;
pub mod team;
pub mod tools;
pub mod types;
pub mod util;
