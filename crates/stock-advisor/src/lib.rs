//! Stock advisory pipeline
//!
//! Given a company name, the pipeline:
//!
//! - fetches recent headlines from NewsAPI ([`NewsFetcher`])
//! - resolves the ticker and fetches the latest intraday prices from Alpha
//!   Vantage ([`TickerResolver`], [`MarketDataFetcher`])
//! - asks a language model for three takeaways ([`Summarizer`])
//! - asks it again for a Buy/Hold/Sell call ([`Advisor`])
//!
//! The stages can be chained directly with [`Pipeline::analyze`], or exposed
//! as a closed set of actions to a model-driven reasoning loop
//! ([`Orchestrator`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_llm::{ChatModel, providers::OpenAIProvider};
//! use stock_advisor::{AdvisorConfig, Orchestrator, Pipeline, ReqwestTransport, goal_prompt};
//! use std::sync::Arc;
//!
//! let config = AdvisorConfig::from_env()?;
//! let provider = Arc::new(OpenAIProvider::new(config.openai_api_key.clone())?);
//! let model = Arc::new(ChatModel::new(provider.clone(), config.model.clone()));
//! let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
//!
//! let pipeline = Pipeline::from_config(&config, transport, model);
//! let orchestrator = Orchestrator::new(provider, pipeline, &config);
//! println!("{}", orchestrator.run(&goal_prompt("Tesla")?).await?);
//! ```

pub mod actions;
pub mod advisor;
pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod market;
pub mod news;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod resolver;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use actions::{Action, ActionKind, ActionOutcome, tool_definitions};
pub use advisor::{Advice, Advisor, Recommendation};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, ErrorKind, Result, Stage};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use market::{MarketDataFetcher, MarketSample, PricePoint};
pub use news::{Headline, NewsBundle, NewsFetcher};
pub use orchestrator::{Orchestrator, Run, Step};
pub use pipeline::Pipeline;
pub use prompts::goal_prompt;
pub use resolver::{TickerResolver, TickerSymbol};
pub use summarizer::{Summarizer, Summary};
