//! Data-provider tools: chart, profile, statistics, summary and earnings lookups.

use crate::config::AssistantConfig;
use crate::sdk::{SessionContext, ToolRegistry, ToolResult};
use reqwest::Client;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::chart::{self, ViewMode};

pub const CHART_PATH: &str = "/stock/get-chart";
pub const PROFILE_PATH: &str = "/stock/get-profile";
pub const STATISTICS_PATH: &str = "/stock/get-statistics";
pub const SUMMARY_PATH: &str = "/stock/get-summary";
pub const EARNINGS_PATH: &str = "/stock/get-earnings";

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

/// `(tool name, description, path, payload key)` for the single-symbol lookups.
const LOOKUPS: [(&str, &str, &str, &str); 4] = [
    (
        "getStockProfile",
        "Fetches company profile information for a given stock symbol",
        PROFILE_PATH,
        "profileData",
    ),
    (
        "getStockStatistics",
        "Fetches key statistics for a given stock symbol",
        STATISTICS_PATH,
        "statisticsData",
    ),
    (
        "getStockSummary",
        "Fetches summary information for a given stock symbol",
        SUMMARY_PATH,
        "summaryData",
    ),
    (
        "getStockEarnings",
        "Fetches earnings information for a given stock symbol",
        EARNINGS_PATH,
        "earningsData",
    ),
];

/// Failure of a single data-provider request. Rendered into the tool's `error` field.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("data provider API key not loaded")]
    MissingApiKey,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("data provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SymbolArgs {
    /// Stock symbol (e.g., GOOG, AAPL)
    pub symbol: String,
    /// Region code (e.g., US)
    #[serde(default)]
    pub region: Option<String>,
}

impl SymbolArgs {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("symbol", self.symbol.clone())];
        push_text(&mut query, "region", self.region.as_deref());
        query
    }
}

/// Comparison symbols, accepted either comma-joined or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Comparisons {
    List(Vec<String>),
    Joined(String),
}

impl Comparisons {
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::List(symbols) => symbols.join(","),
            Self::Joined(symbols) => symbols.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartArgs {
    /// Stock symbol (e.g., GOOG, AAPL)
    pub symbol: String,
    /// Region code (e.g., US)
    #[serde(default)]
    pub region: Option<String>,
    /// Language code (e.g., en-US)
    #[serde(default)]
    pub lang: Option<String>,
    /// Comma-separated list of symbols for comparison (e.g., AAPL,MSFT)
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub comparisons: Option<Comparisons>,
    /// Whether to use Yahoo Finance ID
    #[serde(default)]
    pub use_yfid: Option<bool>,
    /// Start date in YYYY-MM-DD format (cannot be used with range)
    #[serde(default)]
    pub period1: Option<String>,
    /// Comma-separated list of events: capitalGain, div, split, earn, history
    #[serde(default)]
    pub events: Option<String>,
    /// End date in YYYY-MM-DD format (cannot be used with range)
    #[serde(default)]
    pub period2: Option<String>,
    /// Time range (e.g., 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd)
    #[serde(default)]
    pub range: Option<String>,
    /// Time interval (e.g., 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo, 3mo)
    #[serde(default)]
    pub interval: Option<String>,
    /// Whether to include pre/post market data
    #[serde(default)]
    pub include_pre_post: Option<bool>,
}

impl ChartArgs {
    fn comparison_list(&self) -> Option<String> {
        self.comparisons.as_ref().map(Comparisons::joined).filter(|joined| !joined.is_empty())
    }

    /// Query pairs in the provider's documented order; empty values are left out.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("symbol", self.symbol.clone())];
        push_text(&mut query, "region", self.region.as_deref());
        push_text(&mut query, "lang", self.lang.as_deref());
        push_text(&mut query, "comparisons", self.comparison_list().as_deref());
        if let Some(flag) = self.use_yfid {
            query.push(("useYfid", flag.to_string()));
        }
        push_text(&mut query, "period1", self.period1.as_deref());
        push_text(&mut query, "events", self.events.as_deref());
        push_text(&mut query, "period2", self.period2.as_deref());
        push_text(&mut query, "range", self.range.as_deref());
        push_text(&mut query, "interval", self.interval.as_deref());
        if let Some(flag) = self.include_pre_post {
            query.push(("includePrePost", flag.to_string()));
        }
        query.push(("includeAdjustedClose", "true".to_string()));
        query
    }
}

fn push_text(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        query.push((key, value.to_string()));
    }
}

/// HTTP client for the financial data provider.
#[derive(Debug, Clone)]
pub struct FinanceClient {
    http: Client,
    base_url: Url,
    host: String,
    context: Arc<SessionContext>,
}

impl FinanceClient {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn new(config: &AssistantConfig, context: Arc<SessionContext>) -> crate::Result<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.finance_base_url())?,
            host: config.finance_host.clone(),
            context,
        })
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// GET `path` with the provider headers and decode the JSON body.
    ///
    /// # Errors
    /// Fails if no API key is loaded, the request fails, the status is not a
    /// success, or the body carries a non-null `error` field.
    pub async fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value, FetchError> {
        let key = self.context.api_key().await.ok_or(FetchError::MissingApiKey)?;
        let url = self.base_url.join(path)?;
        tracing::debug!(%url, ?query, "Fetching from data provider");

        let res = self
            .http
            .get(url)
            .query(query)
            .header(API_KEY_HEADER, key.expose())
            .header(API_HOST_HEADER, &self.host)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let body: Value = res.json().await?;
        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            tracing::warn!(path, "Data provider error: {error}");
            let message = match error {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Err(FetchError::Provider(message));
        }
        Ok(body)
    }

    /// Fetch `path` and wrap the body under `key`, or report the failure.
    pub async fn fetch_wrapped(&self, path: &str, query: &[(&'static str, String)], key: &str) -> ToolResult {
        match self.get_json(path, query).await {
            Ok(body) => ToolResult::with_data(key, body),
            Err(err) => ToolResult::failure(err.to_string()),
        }
    }

    async fn lookup(&self, tool: &str, path: &str, key: &str, args: SymbolArgs) -> ToolResult {
        let result = self.fetch_wrapped(path, &args.query(), key).await;
        if let Some(data) = result.get(key) {
            self.context.presentation().display_summary(tool, data);
        }
        result
    }

    async fn chart(&self, args: ChartArgs) -> ToolResult {
        let presentation = self.context.presentation();
        presentation.show_loading();
        let result = self.chart_inner(&args).await;
        presentation.hide_loading();
        result
    }

    async fn chart_inner(&self, args: &ChartArgs) -> ToolResult {
        let mut body = match self.get_json(CHART_PATH, &args.query()).await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(symbol = %args.symbol, "Chart fetch failed: {err}");
                return ToolResult::failure(err.to_string());
            }
        };

        if chart::first_result(&body).is_none() {
            tracing::warn!(symbol = %args.symbol, "Invalid chart response structure");
            return ToolResult::failure("Invalid response structure");
        }

        if let Some(requested) = args.comparison_list() {
            chart::repair_comparisons(&mut body, &requested);
        }

        if let Some(view) = chart::process_chart_data(&body, &args.symbol, ViewMode::default()) {
            self.context.presentation().render_chart(&view);
        }

        let now = chrono::Utc::now().timestamp();
        let summary = chart::summarize(&body, &args.symbol, now).unwrap_or_default();
        ToolResult::with_data("chartData", body).and("summary", Value::String(summary))
    }
}

/// Register `getStockChart` followed by the four lookup tools.
///
/// # Errors
/// Returns an error if any of the names is already bound.
#[allow(clippy::result_large_err)]
pub fn register(registry: &mut ToolRegistry, client: Arc<FinanceClient>) -> crate::Result<()> {
    let chart_client = Arc::clone(&client);
    registry.tool(
        "getStockChart",
        "Fetches chart data for a given stock symbol",
        move |args: ChartArgs| {
            let client = Arc::clone(&chart_client);
            async move { client.chart(args).await }
        },
    )?;

    for (name, description, path, key) in LOOKUPS {
        let client = Arc::clone(&client);
        registry.tool(name, description, move |args: SymbolArgs| {
            let client = Arc::clone(&client);
            async move { client.lookup(name, path, key, args).await }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chart_query_keeps_order_and_skips_empty() {
        let args: ChartArgs = serde_json::from_value(json!({
            "symbol": "AAPL",
            "region": "",
            "comparisons": ["MSFT", "GOOG"],
            "useYfid": true,
            "range": "1mo",
            "includePrePost": false,
        }))
        .unwrap();
        let keys: Vec<_> = args.query().iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(
            keys,
            [
                "symbol=AAPL",
                "comparisons=MSFT,GOOG",
                "useYfid=true",
                "range=1mo",
                "includePrePost=false",
                "includeAdjustedClose=true",
            ]
        );
    }

    #[test]
    fn comparisons_accept_string_or_list() {
        let joined: ChartArgs = serde_json::from_value(json!({ "symbol": "A", "comparisons": "X,Y" })).unwrap();
        assert_eq!(joined.comparison_list().as_deref(), Some("X,Y"));
        let empty: ChartArgs = serde_json::from_value(json!({ "symbol": "A", "comparisons": [] })).unwrap();
        assert!(empty.comparison_list().is_none());
    }

    #[test]
    fn registers_in_catalogue_order() {
        let client = FinanceClient::new(&AssistantConfig::default(), Arc::new(SessionContext::default())).unwrap();
        let mut registry = ToolRegistry::new();
        register(&mut registry, Arc::new(client)).unwrap();
        let names: Vec<_> = registry.describe_all().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["getStockChart", "getStockProfile", "getStockStatistics", "getStockSummary", "getStockEarnings"]
        );
        let chart = &registry.describe_all()[0].parameters;
        assert_eq!(chart["required"], json!(["symbol"]));
        assert_eq!(chart["properties"]["symbol"]["description"], "Stock symbol (e.g., GOOG, AAPL)");
        assert!(chart["properties"].get("includePrePost").is_some());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_request() {
        let config = AssistantConfig {
            finance_base_url: Some("http://127.0.0.1:9".to_string()),
            ..AssistantConfig::default()
        };
        let client = FinanceClient::new(&config, Arc::new(SessionContext::default())).unwrap();
        let result = client.fetch_wrapped(PROFILE_PATH, &[("symbol", "AAPL".to_string())], "profileData").await;
        assert_eq!(result, ToolResult::failure("data provider API key not loaded"));
    }
}
