//! Buy/Hold/Sell recommendation from a summary

use crate::error::{AdvisorError, Result, Stage, detect_marker};
use crate::prompts::{ADVISOR_SYSTEM, advisor_prompt};
use crate::summarizer::Summary;
use advisor_llm::TextGenerator;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub const ALL: [Self; 3] = [Self::Buy, Self::Hold, Self::Sell];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
        }
    }

    /// The keyword mentioned first in `text`, case-insensitively
    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::ALL
            .into_iter()
            .filter_map(|rec| lower.find(rec.keyword()).map(|pos| (pos, rec)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, rec)| rec)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
        })
    }
}

/// Model answer that names a recommendation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    text: String,
    recommendation: Recommendation,
}

impl Advice {
    pub fn parse(text: &str) -> Result<Self> {
        let recommendation = Recommendation::find_in(text)
            .ok_or_else(|| AdvisorError::Format("Advice must include Buy, Hold, or Sell.".to_string()))?;
        Ok(Self {
            text: text.to_string(),
            recommendation,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone)]
pub struct Advisor {
    model: Arc<dyn TextGenerator>,
}

impl Advisor {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    /// Advise on summary text, short-circuiting on a failure marker
    #[instrument(skip_all)]
    pub async fn advise(&self, summary: &str) -> Result<Advice> {
        if summary.trim().is_empty() {
            return Err(AdvisorError::Validation("Summary must be a non-empty string.".to_string()));
        }
        if let Some(marker) = detect_marker(summary) {
            warn!(marker, "summary carries an upstream failure");
            return Err(AdvisorError::upstream(Stage::Advise, summary));
        }
        self.generate(summary).await
    }

    pub async fn advise_summary(&self, summary: &Summary) -> Result<Advice> {
        self.generate(summary.text()).await
    }

    async fn generate(&self, summary: &str) -> Result<Advice> {
        let prompt = advisor_prompt(summary)?;
        let text = self
            .model
            .generate(ADVISOR_SYSTEM, &prompt)
            .await
            .map_err(|e| AdvisorError::model(Stage::Advise, e))?;

        let advice = Advice::parse(text.trim())?;
        info!(recommendation = %advice.recommendation, "advice produced");
        Ok(advice)
    }
}
