//! Test doubles and fixtures shared by the unit tests

use crate::config::AdvisorConfig;
use crate::http::{HttpResponse, HttpTransport, TransportError};
use advisor_llm::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, StopReason, TextGenerator, TokenUsage,
};
use async_trait::async_trait;
use mockall::mock;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub Generator {}

    #[async_trait]
    impl TextGenerator for Generator {
        async fn generate(&self, system_prompt: &str, user_prompt: &str) -> advisor_llm::Result<String>;
    }
}

/// One GET seen by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Replays canned responses in order and records every request
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other(format!("no scripted response for {url}"))))
    }
}

/// Replays canned completions in order and records every request
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> advisor_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::RequestFailed("no scripted completion".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn completion(message: advisor_llm::Message, stop_reason: StopReason) -> CompletionResponse {
    CompletionResponse {
        message,
        stop_reason,
        usage: TokenUsage::default(),
    }
}

/// Keys set, no pacing
pub fn test_config() -> AdvisorConfig {
    AdvisorConfig::builder()
        .openai_api_key("sk-test")
        .alpha_vantage_api_key("av-test")
        .news_api_key("na-test")
        .rate_limit_delay(Duration::ZERO)
        .build()
        .unwrap()
}

pub fn json_response(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    }
}

pub fn symbol_search(symbols: &[&str]) -> HttpResponse {
    let matches: Vec<Value> = symbols
        .iter()
        .map(|s| json!({ "1. symbol": s, "2. name": format!("{s} Inc") }))
        .collect();
    json_response(json!({ "bestMatches": matches }))
}

/// `(timestamp, close, volume)` rows of a 5min series
pub fn intraday(rows: &[(&str, &str, &str)]) -> HttpResponse {
    let series: serde_json::Map<String, Value> = rows
        .iter()
        .map(|(ts, close, volume)| {
            (
                (*ts).to_string(),
                json!({ "1. open": close, "4. close": close, "5. volume": volume }),
            )
        })
        .collect();
    json_response(json!({ "Time Series (5min)": series }))
}

/// `(title, source)` rows
pub fn news(rows: &[(&str, &str)]) -> HttpResponse {
    let articles: Vec<Value> = rows
        .iter()
        .map(|(title, source)| json!({ "title": title, "source": { "id": null, "name": source } }))
        .collect();
    json_response(json!({ "status": "ok", "totalResults": rows.len(), "articles": articles }))
}

pub fn rate_limit_notice() -> HttpResponse {
    json_response(json!({
        "Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
    }))
}
