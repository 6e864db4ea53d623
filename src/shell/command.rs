//! Parsing of shell input lines.

use std::str::FromStr;

use thiserror::Error;

use crate::models::{GroqModel, Temperature};
use crate::team::AgentKind;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Query(String),
    SetModel { kind: AgentKind, model: GroqModel },
    SetTemperature { kind: AgentKind, temperature: Temperature },
    History,
    Clear,
    Status,
    Models,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command `/{0}`; type /help")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown role `{0}`; expected web, finance or team")]
    UnknownRole(String),
    #[error("unknown model `{0}`; type /models for the list")]
    UnknownModel(String),
    #[error("{0}")]
    Temperature(String),
}

const MODEL_USAGE: &str = "/model <web|finance|team> <model-id|number>";
const TEMP_USAGE: &str = "/temp <web|finance|team> <0.0-1.0>";

pub fn parse_command(line: &str) -> Result<ShellCommand, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ShellCommand::Query(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match name.as_str() {
        "model" => {
            let [role, model] = args[..] else {
                return Err(CommandError::Usage(MODEL_USAGE));
            };
            Ok(ShellCommand::SetModel {
                kind: parse_role(role)?,
                model: parse_model(model)?,
            })
        }
        "temp" | "temperature" => {
            let [role, value] = args[..] else {
                return Err(CommandError::Usage(TEMP_USAGE));
            };
            let kind = parse_role(role)?;
            let temperature =
                Temperature::from_str(value).map_err(|e| CommandError::Temperature(e.to_string()))?;
            Ok(ShellCommand::SetTemperature { kind, temperature })
        }
        "history" => Ok(ShellCommand::History),
        "clear" => Ok(ShellCommand::Clear),
        "status" => Ok(ShellCommand::Status),
        "models" => Ok(ShellCommand::Models),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_role(raw: &str) -> Result<AgentKind, CommandError> {
    AgentKind::from_str(raw).map_err(|_| CommandError::UnknownRole(raw.to_string()))
}

/// A model id from the allow-list, or its 1-based position in `/models`.
fn parse_model(raw: &str) -> Result<GroqModel, CommandError> {
    if let Ok(index) = raw.parse::<usize>() {
        return GroqModel::from_index(index).ok_or_else(|| CommandError::UnknownModel(raw.to_string()));
    }
    GroqModel::from_str(raw).map_err(|_| CommandError::UnknownModel(raw.to_string()))
}
