//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentEvent, AgentSettings};
pub use crate::config::AppConfig;
pub use crate::error::{AgentError, Result};
pub use crate::models::{GroqModel, Temperature};
pub use crate::output::{Console, OutputCapture};
pub use crate::provider::ModelProvider;
pub use crate::session::{ChatSession, RoleSelection, RoleSelections, SessionStore, FALLBACK_RESPONSE};
pub use crate::team::{dispatch_query, AgentFactory, AgentKind, ConstructionError, DispatchError};
pub use crate::tools::{AgentTool, AgentToolParameters, DuckDuckGo, Tool, ToolArguments, YFinanceTools};
pub use crate::types::{GenerationSettings, ModelMessage, Role, TextStreamDelta, Usage};
