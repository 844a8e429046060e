//! NewsAPI client (`/v2/everything`)

use crate::error::{AdvisorError, Result};
use crate::http::HttpTransport;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const NEWS_API_BASE_URL: &str = "https://newsapi.org";
const PROVIDER: &str = "NewsAPI";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    pub source: ArticleSource,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

/// NewsAPI client over an [`HttpTransport`]
#[derive(Clone)]
pub struct NewsApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Most recent English articles matching `query`, newest first
    pub async fn everything(&self, query: &str, page_size: u32) -> Result<Vec<Article>> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = page_size.to_string();
        debug!(query, page_size = %page_size, "newsapi request");

        let response = self
            .transport
            .get(
                &url,
                &[
                    ("q", query),
                    ("language", "en"),
                    ("sortBy", "publishedAt"),
                    ("pageSize", page_size.as_str()),
                    ("apiKey", self.api_key.as_str()),
                ],
            )
            .await
            .map_err(|e| e.into_advisor_error(PROVIDER))?;

        let data = response.json_any_status()?;
        let parsed: EverythingResponse = serde_json::from_value(data).map_err(|e| AdvisorError::Parse {
            detail: format!("unexpected {PROVIDER} response: {e}"),
            excerpt: response.excerpt(),
        })?;

        if parsed.status == "error" {
            return Err(provider_error(parsed.code.as_deref(), parsed.message.as_deref()));
        }
        response.require_success(PROVIDER)?;

        Ok(parsed.articles)
    }
}

fn provider_error(code: Option<&str>, message: Option<&str>) -> AdvisorError {
    let message = message.unwrap_or("no message");
    match code {
        Some("rateLimited") => AdvisorError::RateLimit(format!("{PROVIDER} rate limit reached: {message}")),
        Some("apiKeyMissing" | "apiKeyInvalid" | "apiKeyDisabled") => {
            AdvisorError::Config(format!("{PROVIDER} rejected the API key: {message}"))
        }
        _ => AdvisorError::Protocol(format!(
            "{PROVIDER} error ({}): {message}",
            code.unwrap_or("unknown")
        )),
    }
}
