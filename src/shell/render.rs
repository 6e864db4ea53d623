//! Terminal rendering for the chat shell.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};

use crate::models::GroqModel;
use crate::output::RenderCallback;
use crate::session::{SessionState, Turn, TurnRole};
use crate::team::AgentKind;

fn heading<W: Write>(out: &mut W, color: Color, text: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(color),
        SetAttribute(Attribute::Bold),
        Print(text),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print("\n")
    )
}

pub fn role_heading<W: Write>(out: &mut W, role: TurnRole) -> io::Result<()> {
    match role {
        TurnRole::User => heading(out, Color::Cyan, "You"),
        TurnRole::Assistant => heading(out, Color::Green, "Assistant"),
    }
}

pub fn render_turn<W: Write>(out: &mut W, turn: &Turn) -> io::Result<()> {
    role_heading(out, turn.role())?;
    queue!(out, Print(turn.content()), Print("\n\n"))
}

pub fn render_history<W: Write>(out: &mut W, state: &SessionState) -> io::Result<()> {
    if state.transcript().is_empty() {
        queue!(out, Print("(no messages yet)\n"))?;
    }
    for turn in state.transcript().iter() {
        render_turn(out, turn)?;
    }
    out.flush()
}

pub fn render_status<W: Write>(out: &mut W, state: &SessionState) -> io::Result<()> {
    heading(out, Color::Magenta, "Model Selection")?;
    for kind in [AgentKind::Web, AgentKind::Finance, AgentKind::Team] {
        let selection = state.selections().get(kind);
        queue!(
            out,
            Print(format!(
                "  {:<14} {:<40} temperature {}\n",
                kind.label(),
                selection.model.as_str(),
                selection.temperature
            ))
        )?;
    }
    queue!(
        out,
        Print(format!("  {} messages in history\n", state.transcript().len()))
    )?;
    if state.error_count() > 0 {
        render_error_count(out, state.error_count())?;
    }
    out.flush()
}

pub fn render_error_count<W: Write>(out: &mut W, count: u64) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Yellow),
        Print(format!("  Errors encountered: {count}\n")),
        ResetColor
    )
}

pub fn render_models<W: Write>(out: &mut W) -> io::Result<()> {
    heading(out, Color::Magenta, "Available models")?;
    for (i, model) in GroqModel::all().iter().enumerate() {
        queue!(out, Print(format!("  {:>2}. {model}\n", i + 1)))?;
    }
    out.flush()
}

pub fn render_help<W: Write>(out: &mut W) -> io::Result<()> {
    heading(out, Color::Magenta, "Commands")?;
    for (usage, about) in [
        ("<text>", "ask the agent team"),
        ("/model <role> <id|number>", "choose the model for web, finance or team"),
        ("/temp <role> <0.0-1.0>", "set a role's temperature"),
        ("/models", "list available models"),
        ("/history", "show the conversation"),
        ("/clear", "clear chat history"),
        ("/status", "show selections and error count"),
        ("/quit", "leave"),
    ] {
        queue!(out, Print(format!("  {usage:<28} {about}\n")))?;
    }
    out.flush()
}

pub fn render_error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Red),
        Print(message),
        ResetColor,
        Print("\n")
    )?;
    out.flush()
}

pub fn render_notice<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::DarkGrey),
        Print(message),
        ResetColor,
        Print("\n")
    )?;
    out.flush()
}

/// Prompt string, carrying the error count once it is non-zero.
pub fn prompt_text(error_count: u64) -> String {
    if error_count > 0 {
        format!("[errors: {error_count}] > ")
    } else {
        "> ".to_string()
    }
}

/// Appends the unseen tail of the accumulated text to stdout, so a streamed
/// response shows up as it is produced.
#[derive(Debug, Default)]
pub struct LiveRender {
    shown: Mutex<usize>,
}

impl LiveRender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the part of `accumulated` not written yet.
    pub fn update<W: Write>(&self, out: &mut W, accumulated: &str) -> io::Result<()> {
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        let tail = accumulated.get(*shown..).unwrap_or_default();
        if tail.is_empty() {
            return Ok(());
        }
        out.write_all(tail.as_bytes())?;
        out.flush()?;
        *shown = accumulated.len();
        Ok(())
    }

    pub fn shown(&self) -> usize {
        *self.shown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Callback for [`crate::output::Console::capture`] writing to stdout.
    pub fn into_callback(self: Arc<Self>) -> RenderCallback {
        Arc::new(move |accumulated: &str| {
            if let Err(e) = self.update(&mut io::stdout().lock(), accumulated) {
                tracing::debug!(error = %e, "live render failed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_render_writes_only_new_text() {
        let live = LiveRender::new();
        let mut out = Vec::new();
        live.update(&mut out, "Hel").unwrap();
        live.update(&mut out, "Hello").unwrap();
        live.update(&mut out, "Hello").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hello");
        assert_eq!(live.shown(), 5);
    }

    #[test]
    fn prompt_shows_errors_once_non_zero() {
        assert_eq!(prompt_text(0), "> ");
        assert_eq!(prompt_text(2), "[errors: 2] > ");
    }

    #[test]
    fn history_lists_turns_in_order() {
        let mut state = SessionState::new(Default::default());
        state.append_turn(TurnRole::User, "question");
        state.append_turn(TurnRole::Assistant, "answer");
        let mut out = Vec::new();
        render_history(&mut out, &state).unwrap();
        let text = String::from_utf8(out).unwrap();
        let question = text.find("question").unwrap();
        let answer = text.find("answer").unwrap();
        assert!(question < answer);
    }
}
