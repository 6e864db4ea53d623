//! DuckDuckGo web search toolkit.
//!
//! Uses the JavaScript-free HTML endpoint, which needs no API key.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::config::{service, AppConfig};
use crate::error::AgentError;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::AgentToolParameters;

use super::{toolkit_http_client, Toolkit};

pub const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const DEFAULT_MAX_RESULTS: u64 = 5;
const MAX_RESULTS_CAP: u64 = 20;

static RESULT_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)
        .expect("result title regex must compile")
});
static RESULT_SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
        .expect("result snippet regex must compile")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex must compile"));

/// One organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// HTTP client for the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    http: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: toolkit_http_client(false),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, AgentError> {
        let url = format!("{}/html/", self.base_url);
        tracing::debug!(query, "duckduckgo search");
        let resp = self.http.get(&url).query(&[("q", query)]).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::tool(
                "duckduckgo_search",
                format!("search endpoint returned {status}"),
            ));
        }
        let html = resp.text().await?;
        let mut results = parse_results(&html);
        results.truncate(max_results);
        Ok(results)
    }
}

/// Extract organic results from a results page, skipping ads.
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let titles: Vec<_> = RESULT_TITLE_RE.captures_iter(html).collect();
    let mut results = Vec::with_capacity(titles.len());

    for (i, caps) in titles.iter().enumerate() {
        let (Some(whole), Some(href), Some(title)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let href = resolve_href(&decode_entities(href.as_str()));
        if href.contains("duckduckgo.com/y.js") {
            continue;
        }
        let section_end = titles
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let body = RESULT_SNIPPET_RE
            .captures(&html[whole.end()..section_end])
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();

        results.push(SearchResult {
            title: clean_text(title.as_str()),
            href,
            body,
        });
    }
    results
}

/// Unwrap DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=...`).
fn resolve_href(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    decode_entities(stripped.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Web search toolkit.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    client: Arc<DuckDuckGoClient>,
    search: bool,
    fixed_max_results: Option<u64>,
}

impl DuckDuckGo {
    pub fn new(client: DuckDuckGoClient) -> Self {
        Self {
            client: Arc::new(client),
            search: true,
            fixed_max_results: None,
        }
    }

    /// Build against the configured (or public) endpoint.
    pub fn from_config(config: &AppConfig) -> Self {
        let base_url = config
            .get_base_url(service::DUCKDUCKGO)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(DuckDuckGoClient::new(base_url))
    }

    pub fn search(mut self, enabled: bool) -> Self {
        self.search = enabled;
        self
    }

    /// Ignore the model's `max_results` and always return this many.
    pub fn fixed_max_results(mut self, max_results: u64) -> Self {
        self.fixed_max_results = Some(max_results);
        self
    }

    fn search_tool(&self) -> Arc<dyn Tool> {
        let client = self.client.clone();
        let fixed = self.fixed_max_results;
        Arc::new(AgentTool::new(
            "duckduckgo_search",
            "Search DuckDuckGo for a query and return the top results as JSON (title, href, body).",
            AgentToolParameters::object()
                .string("query", "The query to search for", true)
                .integer("max_results", "Number of results to return (default 5)", false)
                .build(),
            move |args, _ctx: ToolExecutionContext| {
                let client = client.clone();
                async move {
                    let query = args.get_str("query")?;
                    let requested = match fixed {
                        Some(n) => n,
                        None => args.get_u64_or("max_results", DEFAULT_MAX_RESULTS)?,
                    };
                    let max_results = requested.clamp(1, MAX_RESULTS_CAP) as usize;
                    let results = client.search(query, max_results).await?;
                    Ok(serde_json::to_value(results)?)
                }
            },
        ))
    }
}

impl Toolkit for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools = Vec::new();
        if self.search {
            tools.push(self.search_tool());
        }
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<div class="result results_links results_links_deep result--ad">
  <h2 class="result__title"><a rel="nofollow" class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a></h2>
  <a class="result__snippet" href="#">Buy now</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">The <b>Rust</b> Programming Language</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">A language empowering <b>everyone</b> &amp; more.</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://example.com/direct">Direct link</a>
  </h2>
</div>
"##;

    #[test]
    fn parses_organic_results_and_skips_ads() {
        let results = parse_results(PAGE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "The Rust Programming Language");
        assert_eq!(results[0].href, "https://www.rust-lang.org/");
        assert_eq!(results[0].body, "A language empowering everyone & more.");
        assert_eq!(results[1].href, "https://example.com/direct");
        assert_eq!(results[1].body, "");
    }

    #[test]
    fn toolkit_exposes_search_only_when_enabled() {
        let toolkit = DuckDuckGo::new(DuckDuckGoClient::new("http://localhost"));
        let names: Vec<String> = toolkit.tools().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["duckduckgo_search"]);
        assert!(toolkit.search(false).tools().is_empty());
    }
}
