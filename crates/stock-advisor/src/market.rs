//! Latest intraday price sample for a company

use crate::api::{AlphaVantageClient, IntradayBar};
use crate::error::{AdvisorError, Result};
use crate::http::pace;
use crate::resolver::{TickerResolver, TickerSymbol};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// Series granularity requested from the provider
pub const INTRADAY_INTERVAL: &str = "5min";

/// One interval of the series
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: String,
    pub close: f64,
    pub volume: String,
}

impl PricePoint {
    fn from_bar(timestamp: &str, bar: &IntradayBar) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            close: bar.close,
            volume: bar.volume.clone(),
        }
    }
}

/// Latest and previous samples of a ticker's intraday series
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSample {
    pub company: String,
    pub ticker: TickerSymbol,
    pub latest: PricePoint,
    pub previous: PricePoint,
}

impl MarketSample {
    /// Latest is the greatest timestamp; previous is the next one down, or
    /// the latest again when the series has a single entry. `None` for an
    /// empty series.
    pub fn from_bars(company: &str, ticker: TickerSymbol, bars: &BTreeMap<String, IntradayBar>) -> Option<Self> {
        let mut newest_first = bars.iter().rev();
        let (latest_ts, latest_bar) = newest_first.next()?;
        let (prev_ts, prev_bar) = newest_first.next().unwrap_or((latest_ts, latest_bar));

        Some(Self {
            company: company.to_string(),
            ticker,
            latest: PricePoint::from_bar(latest_ts, latest_bar),
            previous: PricePoint::from_bar(prev_ts, prev_bar),
        })
    }

    pub fn change(&self) -> f64 {
        self.latest.close - self.previous.close
    }

    /// Zero when the previous close is zero
    #[allow(clippy::float_cmp)]
    pub fn change_percent(&self) -> f64 {
        if self.previous.close == 0.0 {
            0.0
        } else {
            self.change() / self.previous.close * 100.0
        }
    }
}

impl fmt::Display for MarketSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Intraday stock data for {} ({}) at {}:",
            self.company, self.ticker, self.latest.timestamp
        )?;
        writeln!(f, "- Close Price: ${:.2}", self.latest.close)?;
        writeln!(f, "- Change: ${:.2} ({:.2}%)", self.change(), self.change_percent())?;
        write!(f, "- Volume: {}", self.latest.volume)
    }
}

/// Resolves a company's ticker and fetches its latest intraday sample
#[derive(Clone)]
pub struct MarketDataFetcher {
    client: AlphaVantageClient,
    resolver: TickerResolver,
    delay: Duration,
}

impl MarketDataFetcher {
    pub fn new(client: AlphaVantageClient, resolver: TickerResolver, delay: Duration) -> Self {
        Self {
            client,
            resolver,
            delay,
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_intraday(&self, company: &str) -> Result<MarketSample> {
        if !self.client.has_api_key() {
            return Err(AdvisorError::Config("Alpha Vantage API key not set.".to_string()));
        }

        let ticker = self
            .resolver
            .resolve(company)
            .await
            .map_err(|source| AdvisorError::TickerUnresolved {
                company: company.to_string(),
                source: Box::new(source),
            })?;

        pace(self.delay).await;
        let bars = self.client.intraday(ticker.as_str(), INTRADAY_INTERVAL).await?;

        let sample = MarketSample::from_bars(company, ticker, &bars)
            .ok_or_else(|| AdvisorError::NotFound(format!("No intraday data found for {company}.")))?;

        info!(
            ticker = %sample.ticker,
            samples = bars.len(),
            close = sample.latest.close,
            "intraday sample fetched"
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ALPHA_VANTAGE_BASE_URL;
    use crate::error::ErrorKind;
    use crate::http::TransportError;
    use crate::testing::{ScriptedTransport, intraday, json_response, rate_limit_notice, symbol_search};
    use serde_json::json;
    use std::sync::Arc;

    fn fetcher(transport: &Arc<ScriptedTransport>, key: &str) -> MarketDataFetcher {
        let client = AlphaVantageClient::new(transport.clone(), ALPHA_VANTAGE_BASE_URL, key);
        let resolver = TickerResolver::new(client.clone(), 2, Duration::ZERO);
        MarketDataFetcher::new(client, resolver, Duration::ZERO)
    }

    fn bars(rows: &[(&str, f64)]) -> BTreeMap<String, IntradayBar> {
        rows.iter()
            .map(|(ts, close)| {
                (
                    (*ts).to_string(),
                    IntradayBar {
                        close: *close,
                        volume: "100".to_string(),
                    },
                )
            })
            .collect()
    }

    fn ticker() -> TickerSymbol {
        TickerSymbol::parse("TSLA").unwrap()
    }

    #[test]
    fn test_single_sample_has_zero_change() {
        let sample = MarketSample::from_bars("Tesla", ticker(), &bars(&[("2024-05-01 16:00:00", 250.0)])).unwrap();
        assert_eq!(sample.latest, sample.previous);
        assert!(sample.change().abs() < f64::EPSILON);
        assert!(sample.change_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_previous_close_reports_zero_percent() {
        let sample = MarketSample::from_bars(
            "Tesla",
            ticker(),
            &bars(&[("2024-05-01 15:55:00", 0.0), ("2024-05-01 16:00:00", 10.0)]),
        )
        .unwrap();

        assert!((sample.change() - 10.0).abs() < f64::EPSILON);
        assert!(sample.change_percent().abs() < f64::EPSILON);
        assert!(sample.to_string().contains("- Change: $10.00 (0.00%)"));
    }

    #[test]
    fn test_previous_is_second_most_recent() {
        let sample = MarketSample::from_bars(
            "Tesla",
            ticker(),
            &bars(&[
                ("2024-05-01 15:50:00", 100.0),
                ("2024-05-01 15:55:00", 200.0),
                ("2024-05-01 16:00:00", 210.0),
            ]),
        )
        .unwrap();

        assert_eq!(sample.latest.timestamp, "2024-05-01 16:00:00");
        assert_eq!(sample.previous.timestamp, "2024-05-01 15:55:00");
        assert!((sample.change() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_has_no_sample() {
        assert!(MarketSample::from_bars("Tesla", ticker(), &BTreeMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_fetch_intraday_formats_sample() {
        let transport = ScriptedTransport::new(vec![
            Ok(symbol_search(&["TSLA"])),
            Ok(intraday(&[
                ("2024-05-01 15:55:00", "245.0000", "900"),
                ("2024-05-01 16:00:00", "250.0000", "1200"),
            ])),
        ]);

        let sample = fetcher(&transport, "av").fetch_intraday("Tesla").await.unwrap();
        assert_eq!(
            sample.to_string(),
            "Intraday stock data for Tesla (TSLA) at 2024-05-01 16:00:00:\n\
             - Close Price: $250.00\n\
             - Change: $5.00 (2.04%)\n\
             - Volume: 1200"
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].param("function"), Some("TIME_SERIES_INTRADAY"));
        assert_eq!(requests[1].param("symbol"), Some("TSLA"));
    }

    #[tokio::test]
    async fn test_fetch_intraday_is_repeatable() {
        let script = || {
            vec![
                Ok::<_, TransportError>(symbol_search(&["TSLA"])),
                Ok(intraday(&[
                    ("2024-05-01 15:55:00", "245.0000", "900"),
                    ("2024-05-01 16:00:00", "250.0000", "1200"),
                ])),
            ]
        };
        let transport = ScriptedTransport::new([script(), script()].concat());
        let fetcher = fetcher(&transport, "av");

        let first = fetcher.fetch_intraday("Tesla").await.unwrap().to_string();
        let second = fetcher.fetch_intraday("Tesla").await.unwrap().to_string();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let transport = ScriptedTransport::new(vec![]);
        let err = fetcher(&transport, "").fetch_intraday("Tesla").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.to_string(), "Error: Alpha Vantage API key not set.");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_ticker_names_company() {
        let transport = ScriptedTransport::new(vec![Ok(json_response(json!({ "bestMatches": [] })))]);
        let err = fetcher(&transport, "av").fetch_intraday("Nowhere Corp").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "No stock price data found for Nowhere Corp: No matches found for nowhere corp."
        );
    }

    #[tokio::test]
    async fn test_empty_series_is_not_found() {
        let transport = ScriptedTransport::new(vec![
            Ok(symbol_search(&["TSLA"])),
            Ok(json_response(json!({ "Meta Data": {} }))),
        ]);
        let err = fetcher(&transport, "av").fetch_intraday("Tesla").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "No intraday data found for Tesla.");
    }

    #[tokio::test]
    async fn test_intraday_throttle_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(symbol_search(&["TSLA"])),
            Ok(rate_limit_notice()),
            Ok(intraday(&[("2024-05-01 16:00:00", "250.0000", "1200")])),
        ]);
        let err = fetcher(&transport, "av").fetch_intraday("Tesla").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_intraday_timeout_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(symbol_search(&["TSLA"])), Err(TransportError::Timeout)]);
        let err = fetcher(&transport, "av").fetch_intraday("Tesla").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(transport.requests().len(), 2);
    }
}
