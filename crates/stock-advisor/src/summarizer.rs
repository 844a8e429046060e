//! Three-takeaway summary of news and market data

use crate::error::{AdvisorError, Result, Stage, detect_marker};
use crate::market::MarketSample;
use crate::news::NewsBundle;
use crate::prompts::{SUMMARIZER_SYSTEM, summarizer_prompt};
use advisor_llm::TextGenerator;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Number of bullet lines a summary must carry
pub const TAKEAWAYS: usize = 3;

/// Validated model output with exactly three `-` bullet lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary(String);

impl Summary {
    pub fn parse(text: &str) -> Result<Self> {
        let bullets = text.lines().filter(|line| line.trim_start().starts_with('-')).count();
        if bullets != TAKEAWAYS {
            return Err(AdvisorError::Format(
                "Summary must contain exactly 3 bullet points.".to_string(),
            ));
        }
        Ok(Self(text.to_string()))
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// The bullet lines, marker and surrounding whitespace removed
    pub fn bullets(&self) -> Vec<&str> {
        self.0
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix('-'))
            .map(str::trim)
            .collect()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    /// Summarize rendered news and market text.
    ///
    /// Either input carrying a failure marker short-circuits with
    /// [`AdvisorError::Upstream`] and the model is never called.
    #[instrument(skip_all)]
    pub async fn summarize(&self, news: &str, market: &str) -> Result<Summary> {
        if news.trim().is_empty() {
            return Err(AdvisorError::Validation("News text must be a non-empty string.".to_string()));
        }
        if let Some(marker) = detect_marker(news) {
            warn!(marker, "news input carries an upstream failure");
            return Err(AdvisorError::upstream(Stage::Summarize, news));
        }
        if market.trim().is_empty() {
            return Err(AdvisorError::Validation("Stock data must be a non-empty string.".to_string()));
        }
        if let Some(marker) = detect_marker(market) {
            warn!(marker, "market input carries an upstream failure");
            return Err(AdvisorError::upstream(Stage::Summarize, market));
        }

        self.generate(news, market).await
    }

    /// Summarize already-fetched values; they cannot carry failures
    pub async fn summarize_data(&self, news: &NewsBundle, market: &MarketSample) -> Result<Summary> {
        self.generate(&news.to_string(), &market.to_string()).await
    }

    async fn generate(&self, news: &str, market: &str) -> Result<Summary> {
        let prompt = summarizer_prompt(news, market)?;
        debug!(prompt_len = prompt.len(), "requesting summary");

        let text = self
            .model
            .generate(SUMMARIZER_SYSTEM, &prompt)
            .await
            .map_err(|e| AdvisorError::model(Stage::Summarize, e))?;

        let summary = Summary::parse(text.trim())?;
        info!("summary produced");
        Ok(summary)
    }
}
