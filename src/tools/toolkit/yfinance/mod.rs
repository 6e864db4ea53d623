//! Yahoo Finance market-data toolkit.

pub mod client;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::{json, Map, Value};

use crate::config::AppConfig;
use crate::error::AgentError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::AgentToolParameters;

pub use client::YahooFinanceClient;
use client::raw;

use super::Toolkit;

const PERIODS: &[&str] = &["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];
const INTERVALS: &[&str] = &["1d", "5d", "1wk", "1mo", "3mo"];
const DEFAULT_NEWS_STORIES: u64 = 3;

/// Financial data toolkit; every capability is off until enabled.
#[derive(Debug, Clone)]
pub struct YFinanceTools {
    client: Arc<YahooFinanceClient>,
    stock_price: bool,
    analyst_recommendations: bool,
    stock_fundamentals: bool,
    company_info: bool,
    company_news: bool,
    historical_prices: bool,
}

impl YFinanceTools {
    pub fn new(client: YahooFinanceClient) -> Self {
        Self {
            client: Arc::new(client),
            stock_price: false,
            analyst_recommendations: false,
            stock_fundamentals: false,
            company_info: false,
            company_news: false,
            historical_prices: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(YahooFinanceClient::from_config(config))
    }

    pub fn stock_price(mut self, enabled: bool) -> Self {
        self.stock_price = enabled;
        self
    }

    pub fn analyst_recommendations(mut self, enabled: bool) -> Self {
        self.analyst_recommendations = enabled;
        self
    }

    pub fn stock_fundamentals(mut self, enabled: bool) -> Self {
        self.stock_fundamentals = enabled;
        self
    }

    pub fn company_info(mut self, enabled: bool) -> Self {
        self.company_info = enabled;
        self
    }

    pub fn company_news(mut self, enabled: bool) -> Self {
        self.company_news = enabled;
        self
    }

    pub fn historical_prices(mut self, enabled: bool) -> Self {
        self.historical_prices = enabled;
        self
    }

    /// Enable every capability.
    pub fn all(self) -> Self {
        self.stock_price(true)
            .analyst_recommendations(true)
            .stock_fundamentals(true)
            .company_info(true)
            .company_news(true)
            .historical_prices(true)
    }
}

impl Toolkit for YFinanceTools {
    fn name(&self) -> &str {
        "yfinance_tools"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools = Vec::new();
        if self.stock_price {
            tools.push(symbol_tool(
                &self.client,
                "get_current_stock_price",
                "Get the current stock price for a given ticker symbol.",
                current_stock_price,
            ));
        }
        if self.company_info {
            tools.push(symbol_tool(
                &self.client,
                "get_company_info",
                "Get company profile, valuation and financial overview for a ticker symbol.",
                company_info,
            ));
        }
        if self.stock_fundamentals {
            tools.push(symbol_tool(
                &self.client,
                "get_stock_fundamentals",
                "Get fundamental data (market cap, P/E, P/B, dividend yield, EPS, beta, 52-week range) for a ticker symbol.",
                stock_fundamentals,
            ));
        }
        if self.analyst_recommendations {
            tools.push(symbol_tool(
                &self.client,
                "get_analyst_recommendations",
                "Get analyst recommendation counts (strong buy to strong sell) by period for a ticker symbol.",
                analyst_recommendations,
            ));
        }
        if self.company_news {
            tools.push(company_news_tool(&self.client));
        }
        if self.historical_prices {
            tools.push(historical_prices_tool(&self.client));
        }
        tools
    }
}

type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, AgentError>> + Send + 'a>>;
type SymbolFetch = for<'a> fn(&'a YahooFinanceClient, &'a str) -> FetchFuture<'a>;

fn symbol_tool(
    client: &Arc<YahooFinanceClient>,
    name: &'static str,
    description: &'static str,
    fetch: SymbolFetch,
) -> Arc<dyn Tool> {
    let client = client.clone();
    Arc::new(AgentTool::new(
        name,
        description,
        AgentToolParameters::object()
            .string("symbol", "The stock ticker symbol, e.g. NVDA", true)
            .build(),
        move |args: ToolArguments, _ctx: ToolExecutionContext| {
            let client = client.clone();
            async move {
                let symbol = args.get_symbol("symbol")?;
                fetch(&client, &symbol)
                    .await
                    .map_err(|e| AgentError::tool(name, e.to_string()))
            }
        },
    ))
}

fn current_stock_price<'a>(
    client: &'a YahooFinanceClient,
    symbol: &'a str,
) -> FetchFuture<'a> {
    Box::pin(async move {
        let chart = client.chart(symbol, "1d", "1d").await?;
        let meta = chart.get("meta").cloned().unwrap_or(Value::Null);
        let price = meta
            .get("regularMarketPrice")
            .and_then(Value::as_f64)
            .ok_or_else(|| AgentError::InvalidArgument(format!("no price available for {symbol}")))?;
        Ok(json!({
            "symbol": symbol,
            "price": round4(price),
            "currency": meta.get("currency").cloned().unwrap_or(Value::Null),
        }))
    })
}

fn company_info<'a>(
    client: &'a YahooFinanceClient,
    symbol: &'a str,
) -> FetchFuture<'a> {
    Box::pin(async move {
        let summary = client
            .quote_summary(
                symbol,
                &["assetProfile", "price", "summaryDetail", "financialData", "defaultKeyStatistics"],
            )
            .await?;
        let profile = summary.get("assetProfile");
        let price = summary.get("price");
        let detail = summary.get("summaryDetail");
        let financial = summary.get("financialData");
        let stats = summary.get("defaultKeyStatistics");
        let field = |section: Option<&Value>, key: &str| raw(section.and_then(|s| s.get(key)));

        let mut info = Map::new();
        info.insert("Name".into(), field(price, "longName"));
        info.insert("Symbol".into(), json!(symbol));
        info.insert("Current Stock Price".into(), field(financial, "currentPrice"));
        info.insert("Currency".into(), field(price, "currency"));
        info.insert("Market Cap".into(), field(price, "marketCap"));
        info.insert("Sector".into(), field(profile, "sector"));
        info.insert("Industry".into(), field(profile, "industry"));
        info.insert("Address".into(), field(profile, "address1"));
        info.insert("City".into(), field(profile, "city"));
        info.insert("State".into(), field(profile, "state"));
        info.insert("Zip".into(), field(profile, "zip"));
        info.insert("Country".into(), field(profile, "country"));
        info.insert("EPS".into(), field(stats, "trailingEps"));
        info.insert("P/E Ratio".into(), field(detail, "trailingPE"));
        info.insert("52 Week Low".into(), field(detail, "fiftyTwoWeekLow"));
        info.insert("52 Week High".into(), field(detail, "fiftyTwoWeekHigh"));
        info.insert("50 Day Average".into(), field(detail, "fiftyDayAverage"));
        info.insert("200 Day Average".into(), field(detail, "twoHundredDayAverage"));
        info.insert("Website".into(), field(profile, "website"));
        info.insert("Summary".into(), field(profile, "longBusinessSummary"));
        info.insert("Analyst Recommendation".into(), field(financial, "recommendationKey"));
        info.insert(
            "Number Of Analyst Opinions".into(),
            field(financial, "numberOfAnalystOpinions"),
        );
        info.insert("Employees".into(), field(profile, "fullTimeEmployees"));
        info.insert("Total Cash".into(), field(financial, "totalCash"));
        info.insert("Free Cash flow".into(), field(financial, "freeCashflow"));
        info.insert("Operating Cash flow".into(), field(financial, "operatingCashflow"));
        info.insert("EBITDA".into(), field(financial, "ebitda"));
        info.insert("Revenue Growth".into(), field(financial, "revenueGrowth"));
        info.insert("Gross Margins".into(), field(financial, "grossMargins"));
        info.insert("Ebitda Margins".into(), field(financial, "ebitdaMargins"));
        info.retain(|_, v| !v.is_null());
        Ok(Value::Object(info))
    })
}

fn stock_fundamentals<'a>(
    client: &'a YahooFinanceClient,
    symbol: &'a str,
) -> FetchFuture<'a> {
    Box::pin(async move {
        let summary = client
            .quote_summary(
                symbol,
                &["price", "summaryProfile", "summaryDetail", "defaultKeyStatistics"],
            )
            .await?;
        let price = summary.get("price");
        let profile = summary.get("summaryProfile");
        let detail = summary.get("summaryDetail");
        let stats = summary.get("defaultKeyStatistics");
        let field = |section: Option<&Value>, key: &str| raw(section.and_then(|s| s.get(key)));

        Ok(json!({
            "symbol": symbol,
            "company_name": field(price, "longName"),
            "sector": field(profile, "sector"),
            "industry": field(profile, "industry"),
            "market_cap": field(price, "marketCap"),
            "pe_ratio": field(detail, "trailingPE"),
            "forward_pe": field(detail, "forwardPE"),
            "pb_ratio": field(stats, "priceToBook"),
            "dividend_yield": field(detail, "dividendYield"),
            "eps": field(stats, "trailingEps"),
            "beta": field(detail, "beta"),
            "52_week_high": field(detail, "fiftyTwoWeekHigh"),
            "52_week_low": field(detail, "fiftyTwoWeekLow"),
        }))
    })
}

fn analyst_recommendations<'a>(
    client: &'a YahooFinanceClient,
    symbol: &'a str,
) -> FetchFuture<'a> {
    Box::pin(async move {
        let summary = client.quote_summary(symbol, &["recommendationTrend"]).await?;
        let trend = summary
            .get("recommendationTrend")
            .and_then(|r| r.get("trend"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let rows: Vec<Value> = trend
            .iter()
            .map(|row| {
                json!({
                    "period": raw(row.get("period")),
                    "strongBuy": raw(row.get("strongBuy")),
                    "buy": raw(row.get("buy")),
                    "hold": raw(row.get("hold")),
                    "sell": raw(row.get("sell")),
                    "strongSell": raw(row.get("strongSell")),
                })
            })
            .collect();
        Ok(json!({ "symbol": symbol, "recommendations": rows }))
    })
}

fn company_news_tool(client: &Arc<YahooFinanceClient>) -> Arc<dyn Tool> {
    let client = client.clone();
    Arc::new(AgentTool::new(
        "get_company_news",
        "Get the latest news stories about a company by ticker symbol.",
        AgentToolParameters::object()
            .string("symbol", "The stock ticker symbol, e.g. TSLA", true)
            .integer("num_stories", "Number of stories to return (default 3)", false)
            .build(),
        move |args: ToolArguments, _ctx: ToolExecutionContext| {
            let client = client.clone();
            async move {
                let symbol = args.get_symbol("symbol")?;
                let count = args
                    .get_u64_or("num_stories", DEFAULT_NEWS_STORIES)?
                    .clamp(1, 20);
                let items = client
                    .news(&symbol, count)
                    .await
                    .map_err(|e| AgentError::tool("get_company_news", e.to_string()))?;
                let stories: Vec<Value> = items
                    .iter()
                    .take(count as usize)
                    .map(|item| {
                        let published = item
                            .get("providerPublishTime")
                            .and_then(Value::as_i64)
                            .and_then(|ts| DateTime::from_timestamp(ts, 0))
                            .map(|dt| dt.to_rfc3339());
                        json!({
                            "title": item.get("title"),
                            "publisher": item.get("publisher"),
                            "link": item.get("link"),
                            "published_at": published,
                        })
                    })
                    .collect();
                Ok(json!(stories))
            }
        },
    ))
}

fn historical_prices_tool(client: &Arc<YahooFinanceClient>) -> Arc<dyn Tool> {
    let client = client.clone();
    Arc::new(AgentTool::new(
        "get_historical_stock_prices",
        "Get historical OHLCV prices for a ticker symbol over a period.",
        AgentToolParameters::object()
            .string("symbol", "The stock ticker symbol", true)
            .string_enum("period", "Lookback period (default 1mo)", PERIODS, false)
            .string_enum("interval", "Bar interval (default 1d)", INTERVALS, false)
            .build(),
        move |args: ToolArguments, _ctx: ToolExecutionContext| {
            let client = client.clone();
            async move {
                let symbol = args.get_symbol("symbol")?;
                let period = args.get_str_opt("period").unwrap_or("1mo");
                let interval = args.get_str_opt("interval").unwrap_or("1d");
                if !PERIODS.contains(&period) {
                    return Err(AgentError::InvalidArgument(format!("unsupported period: {period}")));
                }
                if !INTERVALS.contains(&interval) {
                    return Err(AgentError::InvalidArgument(format!(
                        "unsupported interval: {interval}"
                    )));
                }
                let chart = client
                    .chart(&symbol, period, interval)
                    .await
                    .map_err(|e| AgentError::tool("get_historical_stock_prices", e.to_string()))?;
                Ok(json!({ "symbol": symbol, "prices": price_rows(&chart) }))
            }
        },
    ))
}

/// Zip chart timestamps with the quote indicator arrays.
fn price_rows(chart: &Value) -> Vec<Value> {
    let timestamps = chart
        .get("timestamp")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let quote = chart
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(Value::as_array)
        .and_then(|q| q.first())
        .cloned()
        .unwrap_or(Value::Null);
    let series = |key: &str, i: usize| {
        quote
            .get(key)
            .and_then(Value::as_array)
            .and_then(|values| values.get(i))
            .and_then(Value::as_f64)
            .map(round4)
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::from_timestamp(ts.as_i64()?, 0)?.date_naive();
            let close = series("close", i)?;
            Some(json!({
                "date": date.to_string(),
                "open": series("open", i),
                "high": series("high", i),
                "low": series("low", i),
                "close": close,
                "volume": series("volume", i).map(|v| v as u64),
            }))
        })
        .collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
