//! Tool system for function calling.

pub mod arguments;
pub mod tool;
pub mod toolkit;
pub mod types;

pub use arguments::ToolArguments;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use toolkit::{DuckDuckGo, Toolkit, YFinanceTools};
pub use types::AgentToolParameters;
