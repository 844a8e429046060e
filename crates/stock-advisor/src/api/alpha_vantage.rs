//! Alpha Vantage API client
//!
//! Covers the two endpoints the advisor needs: `SYMBOL_SEARCH` and
//! `TIME_SERIES_INTRADAY`. Pacing lives with the callers; this client issues
//! exactly one request per method call.

use crate::error::{AdvisorError, Result};
use crate::http::{HttpResponse, HttpTransport};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// One `bestMatches` entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name", default)]
    pub name: Option<String>,
    #[serde(rename = "4. region", default)]
    pub region: Option<String>,
}

/// Close and volume of one intraday interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBar {
    pub close: f64,
    /// Passed through as the provider sent it
    pub volume: String,
}

/// Alpha Vantage client over an [`HttpTransport`]
#[derive(Clone)]
pub struct AlphaVantageClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Symbol search; a response without `bestMatches` is an empty list
    pub async fn search_symbol(&self, keywords: &str) -> Result<Vec<SymbolMatch>> {
        let data = self
            .query(&[("function", "SYMBOL_SEARCH"), ("keywords", keywords)])
            .await?;

        match data.get("bestMatches") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(matches) => serde_json::from_value(matches.clone()).map_err(|e| AdvisorError::Parse {
                detail: format!("unexpected bestMatches shape: {e}"),
                excerpt: excerpt(matches),
            }),
        }
    }

    /// Intraday series ordered by timestamp; a response without the series
    /// is an empty map
    pub async fn intraday(&self, symbol: &str, interval: &str) -> Result<BTreeMap<String, IntradayBar>> {
        let data = self
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval),
            ])
            .await?;

        let series_key = format!("Time Series ({interval})");
        let Some(series) = data.get(&series_key).and_then(Value::as_object) else {
            return Ok(BTreeMap::new());
        };

        series
            .iter()
            .map(|(timestamp, values)| -> Result<(String, IntradayBar)> {
                Ok((timestamp.clone(), parse_bar(timestamp, values)?))
            })
            .collect()
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        debug!(?params, "alpha vantage request");

        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let response: HttpResponse = self
            .transport
            .get(&self.base_url, &query)
            .await
            .map_err(|e| e.into_advisor_error(PROVIDER))?;

        let data = response.json(PROVIDER)?;
        check_notices(&data)?;
        Ok(data)
    }
}

/// Throttling and error notices arrive as 200 responses with a single field
fn check_notices(data: &Value) -> Result<()> {
    if let Some(message) = data.get("Error Message") {
        return Err(AdvisorError::Protocol(format!(
            "{PROVIDER} error: {}",
            text_of(message)
        )));
    }

    if let Some(note) = data.get("Note") {
        return Err(AdvisorError::RateLimit(format!(
            "{PROVIDER} rate limit reached: {}",
            text_of(note)
        )));
    }

    if let Some(info) = data.get("Information") {
        let info = text_of(info);
        if info.to_lowercase().contains("limit") {
            return Err(AdvisorError::RateLimit(format!("{PROVIDER} rate limit reached: {info}")));
        }
    }

    Ok(())
}

fn parse_bar(timestamp: &str, values: &Value) -> Result<IntradayBar> {
    let raw_close = values.get("4. close").map(text_of).unwrap_or_default();
    let close = raw_close.trim().parse::<f64>().map_err(|e| AdvisorError::Parse {
        detail: format!("invalid close price at {timestamp}: {e}"),
        excerpt: excerpt(values),
    })?;

    let volume = values.get("5. volume").map(text_of).unwrap_or_default();

    Ok(IntradayBar { close, volume })
}

/// String values without their JSON quotes
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn excerpt(value: &Value) -> String {
    value.to_string().chars().take(200).collect()
}
