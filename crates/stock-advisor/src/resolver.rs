//! Company name to ticker symbol resolution

use crate::api::AlphaVantageClient;
use crate::error::{AdvisorError, ErrorKind, Result};
use crate::http::pace;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// A validated exchange symbol: 1 to 6 ASCII letters, digits, `.` or `-`
///
/// Longer exchange-suffixed listings that symbol search returns for some
/// non-US companies (`RELIANCE.BSE`, `SIE.DEX`) are rejected, so those
/// companies fail resolution with a [`AdvisorError::Protocol`] naming the
/// symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerSymbol(String);

impl TickerSymbol {
    pub fn parse(raw: &str) -> Result<Self> {
        let symbol = raw.trim();
        let valid = (1..=6).contains(&symbol.len())
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

        if valid {
            Ok(Self(symbol.to_string()))
        } else {
            Err(AdvisorError::Protocol(format!(
                "Unexpected ticker symbol in search results: {raw:?} (expected 1 to 6 letters, digits, '.' or '-')"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TickerSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lookup form of a company name: quotes stripped, lowercased
pub fn normalize_company(company: &str) -> String {
    company
        .chars()
        .filter(|c| !matches!(c, '\'' | '"'))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Resolves company names through symbol search
#[derive(Clone)]
pub struct TickerResolver {
    client: AlphaVantageClient,
    retries: u32,
    delay: Duration,
}

impl TickerResolver {
    pub fn new(client: AlphaVantageClient, retries: u32, delay: Duration) -> Self {
        Self { client, retries, delay }
    }

    /// Resolve with the configured retry count and delay
    pub async fn resolve(&self, company: &str) -> Result<TickerSymbol> {
        self.resolve_with(company, self.retries, self.delay).await
    }

    /// Resolve `company`, sleeping `delay` before every attempt and retrying
    /// throttled or failed transports up to `retries` more times
    pub async fn resolve_with(&self, company: &str, retries: u32, delay: Duration) -> Result<TickerSymbol> {
        let keywords = normalize_company(company);
        if keywords.is_empty() || !self.client.has_api_key() {
            return Err(AdvisorError::Validation(
                "Company name and API key cannot be empty.".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            pace(delay).await;

            match self.client.search_symbol(&keywords).await {
                Ok(matches) => {
                    let Some(first) = matches.into_iter().next() else {
                        info!(company = %keywords, "symbol search returned no matches");
                        return Err(AdvisorError::NotFound(format!("No matches found for {keywords}.")));
                    };
                    let ticker = TickerSymbol::parse(&first.symbol)?;
                    info!(company = %keywords, ticker = %ticker, attempt, "ticker resolved");
                    return Ok(ticker);
                }
                Err(err) if err.is_retryable() && attempt < retries => {
                    attempt += 1;
                    warn!(company = %keywords, attempt, retries, error = %err, "symbol search failed, retrying");
                }
                Err(err) if err.kind() == ErrorKind::RateLimit => {
                    warn!(company = %keywords, retries, "symbol search still throttled, giving up");
                    return Err(AdvisorError::RateLimit(format!(
                        "Rate limit exceeded after {retries} retries."
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }
}
