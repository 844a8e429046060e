//! Provider API clients

pub mod alpha_vantage;
pub mod news_api;

pub use alpha_vantage::{ALPHA_VANTAGE_BASE_URL, AlphaVantageClient, IntradayBar, SymbolMatch};
pub use news_api::{Article, ArticleSource, NEWS_API_BASE_URL, NewsApiClient};
