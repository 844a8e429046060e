//! HTTP transport seam shared by the provider clients

use crate::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Characters of response text quoted in protocol and parse errors
const EXCERPT_CHARS: usize = 200;

/// A fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    /// Leading part of the body for error messages
    pub fn excerpt(&self) -> String {
        self.body.chars().take(EXCERPT_CHARS).collect()
    }

    /// Decode the body as JSON after checking the declared content type and
    /// the status
    pub fn json(&self, provider: &str) -> Result<Value> {
        self.require_json()?;
        self.require_success(provider)?;
        self.parse_body()
    }

    /// Like [`json`](Self::json) but accepts any status, for providers that
    /// describe failures in the body
    pub fn json_any_status(&self) -> Result<Value> {
        self.require_json()?;
        self.parse_body()
    }

    pub fn require_success(&self, provider: &str) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(AdvisorError::Protocol(format!(
            "HTTP {} from {provider}: {}",
            self.status,
            self.excerpt()
        )))
    }

    fn require_json(&self) -> Result<()> {
        if self.is_json() {
            return Ok(());
        }
        Err(AdvisorError::Protocol(format!(
            "Non-JSON response received: {}",
            self.excerpt()
        )))
    }

    fn parse_body(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| AdvisorError::Parse {
            detail: e.to_string(),
            excerpt: self.excerpt(),
        })
    }
}

/// Fixed sleep before a rate-limited provider call
pub(crate) async fn pace(delay: Duration) {
    if !delay.is_zero() {
        debug!(delay_ms = delay.as_millis() as u64, "pacing provider call");
        tokio::time::sleep(delay).await;
    }
}

/// Network-level failure before a response was read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Attach the provider name for the user-facing error
    pub fn into_advisor_error(self, provider: &'static str) -> AdvisorError {
        match self {
            Self::Connect(_) => AdvisorError::Connectivity { provider },
            Self::Timeout => AdvisorError::Timeout { provider },
            Self::Other(message) => AdvisorError::Protocol(format!("{provider} request failed: {message}")),
        }
    }
}

/// GET with query parameters
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> std::result::Result<HttpResponse, TransportError>;
}

/// Production transport over a single reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Every call made through this transport is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdvisorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// The error's URL carries the query string, API key included, so it is
/// dropped before the error is rendered
fn classify(err: reqwest::Error) -> TransportError {
    let err = err.without_url();
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(classify)?;

        debug!(url, status, content_type = content_type.as_deref().unwrap_or("unknown"), "http response");

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_json_decodes_valid_body() {
        let value = response(200, Some("application/json; charset=utf-8"), r#"{"a":1}"#)
            .json("Alpha Vantage")
            .unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_non_json_content_type_is_protocol_error() {
        let html = format!("<html>{}</html>", "x".repeat(500));
        let err = response(200, Some("text/html"), &html).json("Alpha Vantage").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Protocol);
        let text = err.to_string();
        assert!(text.starts_with("Error: Non-JSON response received: <html>"));
        assert_eq!(text.len(), "Error: Non-JSON response received: ".len() + EXCERPT_CHARS);
    }

    #[test]
    fn test_missing_content_type_is_protocol_error() {
        let err = response(200, None, "{}").json("NewsAPI").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_error_status_is_protocol_error() {
        let err = response(503, Some("application/json"), r#"{"x":1}"#)
            .json("Alpha Vantage")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("HTTP 503 from Alpha Vantage"));
    }

    #[test]
    fn test_malformed_json_is_parse_error_with_excerpt() {
        let err = response(200, Some("application/json"), "{\"bestMatches\": [")
            .json("Alpha Vantage")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("{\"bestMatches\": ["));
    }

    #[test]
    fn test_transport_error_mapping() {
        let err = TransportError::Timeout.into_advisor_error("Alpha Vantage");
        assert_eq!(err.to_string(), "Error: Request to Alpha Vantage API timed out.");

        let err = TransportError::Connect("refused".into()).into_advisor_error("Alpha Vantage");
        assert_eq!(err.to_string(), "Error: Failed to connect to Alpha Vantage API.");

        let err = TransportError::Other("redirect loop".into()).into_advisor_error("NewsAPI");
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_transport_error_text_omits_api_key() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(b"definitely not http\r\n\r\n").await;
            }
        });

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .get(
                &format!("http://{addr}/query"),
                &[("function", "SYMBOL_SEARCH"), ("keywords", "tesla"), ("apikey", "SECRET-AV-KEY")],
            )
            .await
            .unwrap_err();

        assert!(!format!("{err:?}").contains("SECRET-AV-KEY"));
        let rendered = err.into_advisor_error("Alpha Vantage").to_string();
        assert!(rendered.starts_with("Error: "), "{rendered}");
        assert!(!rendered.contains("SECRET-AV-KEY"), "{rendered}");
        assert!(!rendered.contains("apikey="), "{rendered}");
    }
}
