//! Interactive chat shell over the agent team.

pub mod command;
pub mod render;

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::style::Color;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::session::{ChatSession, SubmitError, TurnRole};
use command::{parse_command, ShellCommand};
use render::LiveRender;

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    session: ChatSession,
}

impl Shell {
    pub fn new(session: ChatSession) -> Self {
        Self { session }
    }

    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }

    /// Read lines from `input` until end of input or `/quit`.
    pub async fn run<R>(&mut self, input: R) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stdout = io::stdout();
        crossterm::queue!(
            stdout,
            crossterm::style::SetForegroundColor(Color::Magenta),
            crossterm::style::Print("AI Agent Team Interface\n"),
            crossterm::style::ResetColor
        )?;
        render::render_notice(&mut stdout, "Type a question, or /help for commands.")?;

        let mut lines = input.lines();
        loop {
            let prompt = render::prompt_text(self.session.state().error_count());
            write!(stdout, "{prompt}")?;
            stdout.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(stdout)?;
                break;
            };
            if self.handle_line(&line, &mut stdout).await? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Act on one line of input.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                render::render_error(out, &e.to_string())?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "shell command");

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Help => render::render_help(out)?,
            ShellCommand::Models => render::render_models(out)?,
            ShellCommand::Status => render::render_status(out, self.session.state())?,
            ShellCommand::History => render::render_history(out, self.session.state())?,
            ShellCommand::Clear => {
                self.session.state().clear();
                render::render_notice(out, "Chat history cleared.")?;
            }
            ShellCommand::SetModel { kind, model } => {
                self.session.state().selections_mut().get_mut(kind).model = model;
                render::render_notice(out, &format!("{} model set to {model}", kind.label()))?;
            }
            ShellCommand::SetTemperature { kind, temperature } => {
                self.session.state().selections_mut().get_mut(kind).temperature = temperature;
                render::render_notice(
                    out,
                    &format!("{} temperature set to {temperature}", kind.label()),
                )?;
            }
            ShellCommand::Query(query) => self.query(&query, out).await?,
        }
        Ok(Flow::Continue)
    }

    async fn query<W: Write>(&mut self, query: &str, out: &mut W) -> io::Result<()> {
        let prepared = match self.session.prepare(query) {
            Ok(prepared) => prepared,
            Err(SubmitError::EmptyQuery) => return Ok(()),
            Err(SubmitError::Construction(e)) => {
                render::render_error(out, &e.to_string())?;
                return out.flush();
            }
        };

        // The heading goes out only once there is a team to answer.
        render::role_heading(out, TurnRole::Assistant)?;
        out.flush()?;

        let live = Arc::new(LiveRender::new());
        let reply = self
            .session
            .send(prepared, Some(live.clone().into_callback()))
            .await;
        if let Some(error) = reply.error {
            if live.shown() > 0 {
                writeln!(out)?;
            }
            render::render_error(out, &error)?;
            writeln!(out, "{}", reply.text)?;
        }
        writeln!(out)?;
        out.flush()
    }
}
