//! Yahoo Finance HTTP client.
//!
//! `quoteSummary` needs a session cookie plus a matching crumb; the chart and
//! search endpoints do not. The crumb is fetched lazily and refreshed once on
//! an authorization failure.

use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::{service, AppConfig};
use crate::error::AgentError;

use crate::tools::toolkit::toolkit_http_client;

pub const DEFAULT_QUERY_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

#[derive(Debug)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    query_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceClient {
    pub fn new(query_url: impl Into<String>, cookie_url: impl Into<String>) -> Self {
        Self {
            http: toolkit_http_client(true),
            query_url: query_url.into().trim_end_matches('/').to_string(),
            cookie_url: cookie_url.into(),
            crumb: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config
                .get_base_url(service::YFINANCE_QUERY)
                .unwrap_or_else(|| DEFAULT_QUERY_URL.to_string()),
            config
                .get_base_url(service::YFINANCE_COOKIE)
                .unwrap_or_else(|| DEFAULT_COOKIE_URL.to_string()),
        )
    }

    /// `v8/finance/chart` result for one symbol.
    pub async fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<Value, AgentError> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.query_url);
        let body = self
            .get_json(&url, &[("range", range), ("interval", interval)])
            .await?;
        first_result(&body, "chart", symbol)
    }

    /// `v10/finance/quoteSummary` result for the given modules.
    pub async fn quote_summary(&self, symbol: &str, modules: &[&str]) -> Result<Value, AgentError> {
        let url = format!("{}/v10/finance/quoteSummary/{symbol}", self.query_url);
        let modules = modules.join(",");

        let mut refreshed = false;
        loop {
            let crumb = self.crumb(refreshed).await;
            let mut params = vec![("modules", modules.as_str())];
            if let Some(ref crumb) = crumb {
                params.push(("crumb", crumb.as_str()));
            }
            match self.get_json(&url, &params).await {
                Err(AgentError::Api { status: 401, .. }) if !refreshed => {
                    tracing::debug!(symbol, "quoteSummary rejected crumb, refreshing");
                    refreshed = true;
                }
                Ok(body) => return first_result(&body, "quoteSummary", symbol),
                Err(e) => return Err(e),
            }
        }
    }

    /// News items from `v1/finance/search`.
    pub async fn news(&self, symbol: &str, count: u64) -> Result<Vec<Value>, AgentError> {
        let url = format!("{}/v1/finance/search", self.query_url);
        let count = count.to_string();
        let body = self
            .get_json(
                &url,
                &[("q", symbol), ("newsCount", count.as_str()), ("quotesCount", "0")],
            )
            .await?;
        Ok(body
            .get("news")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn crumb(&self, force_refresh: bool) -> Option<String> {
        let mut guard = self.crumb.lock().await;
        if force_refresh {
            *guard = None;
        }
        if guard.is_none() {
            *guard = self.fetch_crumb().await;
        }
        guard.clone()
    }

    async fn fetch_crumb(&self) -> Option<String> {
        // Any response from the cookie endpoint sets the session cookie.
        if let Err(e) = self.http.get(&self.cookie_url).send().await {
            tracing::debug!(error = %e, "yahoo cookie request failed");
        }
        let url = format!("{}/v1/test/getcrumb", self.query_url);
        let resp = self.http.get(&url).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let crumb = resp.text().await.ok()?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return None;
        }
        Some(crumb)
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, AgentError> {
        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if status != 200 {
            return Err(AgentError::api(status, yahoo_error_message(&text)));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn yahoo_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.as_object()?.values().find_map(|section| {
                section
                    .get("error")
                    .and_then(|e| e.get("description"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn first_result(body: &Value, section: &str, symbol: &str) -> Result<Value, AgentError> {
    let section_value = body.get(section).ok_or_else(|| {
        AgentError::InvalidState(format!("yahoo response has no `{section}` section"))
    })?;
    if let Some(error) = section_value.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(AgentError::InvalidArgument(format!("{symbol}: {description}")));
    }
    section_value
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .cloned()
        .ok_or_else(|| AgentError::InvalidArgument(format!("no data found for symbol {symbol}")))
}

/// Unwrap Yahoo's `{"raw": .., "fmt": ..}` number envelope.
pub fn raw(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Object(map)) if map.contains_key("raw") => {
            map.get("raw").cloned().unwrap_or(Value::Null)
        }
        Some(Value::Object(map)) if map.is_empty() => Value::Null,
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_unwraps_envelopes() {
        assert_eq!(raw(Some(&json!({"raw": 1.5, "fmt": "1.50"}))), json!(1.5));
        assert_eq!(raw(Some(&json!({}))), Value::Null);
        assert_eq!(raw(Some(&json!("Technology"))), json!("Technology"));
        assert_eq!(raw(None), Value::Null);
    }

    #[test]
    fn first_result_surfaces_yahoo_errors() {
        let body = json!({"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}});
        let err = first_result(&body, "chart", "ZZZZ").unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn yahoo_error_message_prefers_description() {
        let body = r#"{"finance":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#;
        assert_eq!(yahoo_error_message(body), "Invalid Crumb");
    }
}
