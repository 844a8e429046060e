//! Components wired together from one configuration

use crate::actions::{Action, ActionOutcome};
use crate::advisor::{Advice, Advisor};
use crate::api::{AlphaVantageClient, NewsApiClient};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result, Stage};
use crate::http::HttpTransport;
use crate::market::MarketDataFetcher;
use crate::news::NewsFetcher;
use crate::resolver::TickerResolver;
use crate::summarizer::Summarizer;
use advisor_llm::TextGenerator;
use std::sync::Arc;
use tracing::{info, instrument};

/// The four pipeline stages sharing one transport and one model handle
#[derive(Clone)]
pub struct Pipeline {
    news: NewsFetcher,
    market: MarketDataFetcher,
    summarizer: Summarizer,
    advisor: Advisor,
}

impl Pipeline {
    pub fn new(news: NewsFetcher, market: MarketDataFetcher, summarizer: Summarizer, advisor: Advisor) -> Self {
        Self {
            news,
            market,
            summarizer,
            advisor,
        }
    }

    pub fn from_config(
        config: &AdvisorConfig,
        transport: Arc<dyn HttpTransport>,
        model: Arc<dyn TextGenerator>,
    ) -> Self {
        let alpha_vantage = AlphaVantageClient::new(
            transport.clone(),
            config.alpha_vantage_base_url.clone(),
            config.alpha_vantage_api_key.clone(),
        );
        let resolver = TickerResolver::new(alpha_vantage.clone(), config.ticker_retries, config.rate_limit_delay);
        let news_api = NewsApiClient::new(transport, config.news_api_base_url.clone(), config.news_api_key.clone());

        Self::new(
            NewsFetcher::new(news_api, config.news_page_size),
            MarketDataFetcher::new(alpha_vantage, resolver, config.rate_limit_delay),
            Summarizer::new(model.clone()),
            Advisor::new(model),
        )
    }

    pub fn news(&self) -> &NewsFetcher {
        &self.news
    }

    pub fn market(&self) -> &MarketDataFetcher {
        &self.market
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    /// Run one action; failures come back as error text, never as `Err`
    pub async fn dispatch(&self, action: &Action) -> ActionOutcome {
        match action {
            Action::FetchNews { company } => self.news.fetch_news(company).await.into(),
            Action::FetchIntraday { company } => self.market.fetch_intraday(company).await.into(),
            Action::Summarize { news, market } => self.summarizer.summarize(news, market).await.into(),
            Action::Advise { summary } => self.advisor.advise(summary).await.into(),
        }
    }

    /// Fetch, summarize and advise on `company` without the reasoning loop.
    ///
    /// Stages run in order and the first failure stops the chain, wrapped
    /// for the stage that would have consumed it.
    #[instrument(skip(self))]
    pub async fn analyze(&self, company: &str) -> Result<Advice> {
        let news = self
            .news
            .fetch_news(company)
            .await
            .map_err(|e| AdvisorError::upstream(Stage::Summarize, e))?;
        let market = self
            .market
            .fetch_intraday(company)
            .await
            .map_err(|e| AdvisorError::upstream(Stage::Summarize, e))?;

        let summary = self
            .summarizer
            .summarize_data(&news, &market)
            .await
            .map_err(|e| AdvisorError::upstream(Stage::Advise, e))?;

        let advice = self.advisor.advise_summary(&summary).await?;
        info!(recommendation = %advice.recommendation(), "analysis complete");
        Ok(advice)
    }
}
