//! Chat session state: per-role selections, the transcript and the error
//! counter, plus the submit flow that ties them to the agent team.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{GroqModel, Temperature};
use crate::output::{Console, RenderCallback};
use crate::agent::Agent;
use crate::team::{dispatch_query, AgentFactory, AgentKind, ConstructionError};

/// Shown in place of a response whenever a query fails.
pub const FALLBACK_RESPONSE: &str = "I apologize, but I encountered an error while processing your request. This might be due to API limitations or temporary issues. Please try again in a moment or rephrase your query.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
}

impl Turn {
    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only log of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Model and temperature chosen for one role.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoleSelection {
    pub model: GroqModel,
    pub temperature: Temperature,
}

impl RoleSelection {
    pub fn new(model: GroqModel, temperature: Temperature) -> Self {
        Self { model, temperature }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoleSelections {
    pub web: RoleSelection,
    pub finance: RoleSelection,
    pub team: RoleSelection,
}

impl RoleSelections {
    /// The same selection for every role.
    pub fn uniform(selection: RoleSelection) -> Self {
        Self {
            web: selection,
            finance: selection,
            team: selection,
        }
    }

    pub fn get(&self, kind: AgentKind) -> &RoleSelection {
        match kind {
            AgentKind::Web => &self.web,
            AgentKind::Finance => &self.finance,
            AgentKind::Team => &self.team,
        }
    }

    pub fn get_mut(&mut self, kind: AgentKind) -> &mut RoleSelection {
        match kind {
            AgentKind::Web => &mut self.web,
            AgentKind::Finance => &mut self.finance,
            AgentKind::Team => &mut self.team,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    selections: RoleSelections,
    transcript: Transcript,
    error_count: u64,
}

impl SessionState {
    pub fn new(selections: RoleSelections) -> Self {
        Self {
            selections,
            transcript: Transcript::default(),
            error_count: 0,
        }
    }

    pub fn selections(&self) -> &RoleSelections {
        &self.selections
    }

    pub fn selections_mut(&mut self) -> &mut RoleSelections {
        &mut self.selections
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn append_turn(&mut self, role: TurnRole, content: impl Into<String>) {
        self.transcript.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    /// Empty the transcript. Selections and the error counter are kept.
    pub fn clear(&mut self) {
        self.transcript.turns.clear();
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }
}

/// Holds the session state, created on first use.
#[derive(Debug, Default)]
pub struct SessionStore {
    defaults: RoleSelections,
    state: Option<SessionState>,
}

impl SessionStore {
    pub fn new(defaults: RoleSelections) -> Self {
        Self {
            defaults,
            state: None,
        }
    }

    /// Create the state from defaults if absent; otherwise return it as is.
    pub fn initialize(&mut self) -> &mut SessionState {
        let defaults = self.defaults;
        self.state.get_or_insert_with(|| SessionState::new(defaults))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("query is empty")]
    EmptyQuery,
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// What a submitted query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The text appended as the assistant turn.
    pub text: String,
    /// Why the query failed, when `text` is the fallback.
    pub error: Option<String>,
}

/// A query paired with the team built to answer it.
#[derive(Debug)]
pub struct PreparedQuery {
    team: Agent,
    query: String,
}

/// Interactive chat over the agent team.
pub struct ChatSession {
    store: SessionStore,
    factory: AgentFactory,
    console: Console,
    stream: bool,
}

impl ChatSession {
    pub fn new(factory: AgentFactory, console: Console) -> Self {
        let defaults = factory.config().defaults();
        let selection = RoleSelection::new(defaults.model, defaults.temperature);
        Self {
            store: SessionStore::new(RoleSelections::uniform(selection)),
            factory,
            console,
            stream: true,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn state(&mut self) -> &mut SessionState {
        self.store.initialize()
    }

    /// Rebuild the team from the current selections and send `query`.
    ///
    /// A construction failure returns an error before anything is appended.
    /// Once the query is sent, failures never propagate: the fallback text
    /// becomes the assistant turn and the error counter goes up by one.
    pub async fn submit(
        &mut self,
        query: &str,
        on_render: Option<RenderCallback>,
    ) -> Result<Reply, SubmitError> {
        let prepared = self.prepare(query)?;
        Ok(self.send(prepared, on_render).await)
    }

    /// Validate `query` and build the team for it. Nothing is appended.
    pub fn prepare(&mut self, query: &str) -> Result<PreparedQuery, SubmitError> {
        if query.trim().is_empty() {
            return Err(SubmitError::EmptyQuery);
        }
        let selections = *self.store.initialize().selections();
        let team = self.factory.create_team(&selections)?;
        Ok(PreparedQuery {
            team,
            query: query.to_string(),
        })
    }

    /// Send a prepared query, appending both turns.
    pub async fn send(&mut self, prepared: PreparedQuery, on_render: Option<RenderCallback>) -> Reply {
        let PreparedQuery { team, query } = prepared;
        self.store.initialize().append_turn(TurnRole::User, query.as_str());
        let outcome = dispatch_query(&team, &query, &self.console, self.stream, on_render).await;

        let state = self.store.initialize();
        let reply = match outcome {
            Ok(text) => Reply { text, error: None },
            Err(e) => {
                error!(error = %e, "query failed");
                state.increment_error();
                Reply {
                    text: FALLBACK_RESPONSE.to_string(),
                    error: Some(e.to_string()),
                }
            }
        };
        state.append_turn(TurnRole::Assistant, reply.text.clone());
        info!(
            turns = state.transcript().len(),
            errors = state.error_count(),
            "turn complete"
        );
        reply
    }
}
