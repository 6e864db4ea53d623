//! Turns per-role selections into ready-to-run agents.

use std::sync::Arc;

use strum::{Display, EnumIter, EnumString};
use tracing::info;

use super::ConstructionError;
use crate::agent::{Agent, AgentSettings};
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::models::GroqModel;
use crate::provider::{create_provider, ModelProvider};
use crate::session::{RoleSelection, RoleSelections};
use crate::tools::{DuckDuckGo, YFinanceTools};

/// Resolves a model to a provider. Swappable so tests can script responses.
pub type ProviderResolver =
    Arc<dyn Fn(GroqModel) -> Result<Arc<dyn ModelProvider>, AgentError> + Send + Sync>;

/// The three roles of the chat team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AgentKind {
    Web,
    Finance,
    Team,
}

impl AgentKind {
    /// Display name, also used for the agent's `name`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Web => "Web Agent",
            Self::Finance => "Finance Agent",
            Self::Team => "Team Agent",
        }
    }
}

#[derive(Clone)]
pub struct AgentFactory {
    config: AppConfig,
    resolver: ProviderResolver,
}

impl AgentFactory {
    /// Factory resolving providers against Groq with the keys in `config`.
    pub fn new(config: AppConfig) -> Self {
        let provider_config = config.clone();
        let resolver: ProviderResolver =
            Arc::new(move |model| create_provider(model, &provider_config));
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: AppConfig, resolver: ProviderResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn settings(&self, selection: &RoleSelection) -> AgentSettings {
        AgentSettings::from_defaults(self.config.defaults())
            .with_model(selection.model)
            .with_temperature(selection.temperature)
    }

    fn resolve(
        &self,
        kind: AgentKind,
        model: GroqModel,
    ) -> Result<Arc<dyn ModelProvider>, ConstructionError> {
        (self.resolver)(model).map_err(|source| ConstructionError::Agent {
            kind,
            model,
            source,
        })
    }

    /// Build the web or finance team member.
    pub fn create_single_agent(
        &self,
        kind: AgentKind,
        selection: &RoleSelection,
    ) -> Result<Agent, ConstructionError> {
        let settings = self.settings(selection);
        let agent = match kind {
            AgentKind::Web => {
                let provider = self.resolve(kind, selection.model)?;
                Agent::new(kind.label(), provider, settings)
                    .with_toolkit(&DuckDuckGo::from_config(&self.config))
                    .with_instructions(["Always include sources"])
            }
            AgentKind::Finance => {
                let provider = self.resolve(kind, selection.model)?;
                let toolkit = YFinanceTools::from_config(&self.config)
                    .stock_price(true)
                    .analyst_recommendations(true)
                    .company_info(true);
                Agent::new(kind.label(), provider, settings)
                    .with_role("Get financial data")
                    .with_toolkit(&toolkit)
                    .with_instructions(["Use tables to display data"])
            }
            AgentKind::Team => {
                return Err(ConstructionError::Agent {
                    kind,
                    model: selection.model,
                    source: AgentError::InvalidArgument(
                        "the team agent has members; build it with create_team".into(),
                    ),
                })
            }
        };
        info!(agent = agent.name(), model = %selection.model, "agent created");
        Ok(agent.show_tool_calls(true).with_markdown(true))
    }

    /// Build both members, then the coordinator leading them.
    ///
    /// Any member failure fails the whole team.
    pub fn create_team(&self, selections: &RoleSelections) -> Result<Agent, ConstructionError> {
        let build = || -> Result<Agent, ConstructionError> {
            let web = self.create_single_agent(AgentKind::Web, &selections.web)?;
            let finance = self.create_single_agent(AgentKind::Finance, &selections.finance)?;
            let provider = self.resolve(AgentKind::Team, selections.team.model)?;
            Ok(
                Agent::new(AgentKind::Team.label(), provider, self.settings(&selections.team))
                    .with_team(vec![web, finance])
                    .with_instructions(["Always include sources", "Use tables to display data"])
                    .show_tool_calls(true)
                    .with_markdown(true),
            )
        };
        build().map_err(|e| ConstructionError::Team(Box::new(e)))
    }

    /// The single finance agent used by the one-shot runner.
    pub fn create_script_agent(&self, model: GroqModel) -> Result<Agent, ConstructionError> {
        let selection = RoleSelection {
            model,
            temperature: self.config.defaults().temperature,
        };
        let provider = self.resolve(AgentKind::Finance, model)?;
        let toolkit = YFinanceTools::from_config(&self.config)
            .stock_price(true)
            .analyst_recommendations(true)
            .stock_fundamentals(true);
        Ok(Agent::new("Agent", provider, self.settings(&selection))
            .with_toolkit(&toolkit)
            .with_instructions(["Use tables to display data."])
            .show_tool_calls(true)
            .with_markdown(true))
    }
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
