//! Pre-built tool bundles an agent can be equipped with.

pub mod duckduckgo;
pub mod yfinance;

use std::sync::Arc;

use super::tool::Tool;

pub use duckduckgo::DuckDuckGo;
pub use yfinance::YFinanceTools;

/// A named bundle of related tools with per-tool enable flags.
pub trait Toolkit: Send + Sync {
    fn name(&self) -> &str;

    /// The enabled tools, in a stable order.
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

/// Client used by toolkits; browser-like so public endpoints answer.
pub(crate) fn toolkit_http_client(cookie_store: bool) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        )
        .cookie_store(cookie_store)
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
