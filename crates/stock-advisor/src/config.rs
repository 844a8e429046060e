//! Process configuration
//!
//! Built once at start-up and handed to every component constructor. Nothing
//! below this module reads the environment.

use crate::api::{ALPHA_VANTAGE_BASE_URL, NEWS_API_BASE_URL};
use crate::error::{AdvisorError, Result};
use advisor_llm::providers::openai::DEFAULT_OPENAI_API_BASE;
use std::fmt;
use std::time::Duration;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ALPHA_VANTAGE_API_KEY: &str = "ALPHA_VANTAGE_API_KEY";
pub const NEWSAPI_API_KEY: &str = "NEWSAPI_API_KEY";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Settings shared by the whole pipeline
#[derive(Clone)]
pub struct AdvisorConfig {
    pub openai_api_key: String,
    pub alpha_vantage_api_key: String,
    pub news_api_key: String,

    /// Chat-completions endpoint base
    pub openai_api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,

    pub alpha_vantage_base_url: String,
    pub news_api_base_url: String,

    /// Bound on every provider HTTP call
    pub request_timeout: Duration,
    /// Unconditional sleep before each Alpha Vantage call
    pub rate_limit_delay: Duration,
    /// Extra symbol-search attempts after the first
    pub ticker_retries: u32,
    pub news_page_size: u32,
    /// Reasoning-loop round trips before giving up
    pub max_iterations: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            alpha_vantage_api_key: String::new(),
            news_api_key: String::new(),
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            alpha_vantage_base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            news_api_base_url: NEWS_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            rate_limit_delay: Duration::from_secs(12),
            ticker_retries: 2,
            news_page_size: 5,
            max_iterations: 10,
        }
    }
}

impl AdvisorConfig {
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Read the three credentials (and the optional model settings) from the
    /// process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AdvisorError::Config(format!("Please set the {name} environment variable.")))
        };

        let mut builder = Self::builder()
            .openai_api_key(require(OPENAI_API_KEY)?)
            .alpha_vantage_api_key(require(ALPHA_VANTAGE_API_KEY)?)
            .news_api_key(require(NEWSAPI_API_KEY)?);

        if let Some(base) = lookup("OPENAI_API_BASE").filter(|v| !v.trim().is_empty()) {
            builder = builder.openai_api_base(base);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            builder = builder.model(model);
        }

        builder.build()
    }

    pub fn validate(&self) -> Result<()> {
        if self.news_page_size == 0 || self.news_page_size > 100 {
            return Err(AdvisorError::Config(format!(
                "news page size must be between 1 and 100, got {}",
                self.news_page_size
            )));
        }

        if self.max_iterations == 0 {
            return Err(AdvisorError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("alpha_vantage_api_key", &redact(&self.alpha_vantage_api_key))
            .field("news_api_key", &redact(&self.news_api_key))
            .field("openai_api_base", &self.openai_api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("alpha_vantage_base_url", &self.alpha_vantage_base_url)
            .field("news_api_base_url", &self.news_api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("ticker_retries", &self.ticker_retries)
            .field("news_page_size", &self.news_page_size)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

/// Builder for [`AdvisorConfig`]; unset fields keep their defaults
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    openai_api_key: Option<String>,
    alpha_vantage_api_key: Option<String>,
    news_api_key: Option<String>,
    openai_api_base: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    alpha_vantage_base_url: Option<String>,
    news_api_base_url: Option<String>,
    request_timeout: Option<Duration>,
    rate_limit_delay: Option<Duration>,
    ticker_retries: Option<u32>,
    news_page_size: Option<u32>,
    max_iterations: Option<usize>,
}

impl AdvisorConfigBuilder {
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    pub fn openai_api_base(mut self, url: impl Into<String>) -> Self {
        self.openai_api_base = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn alpha_vantage_base_url(mut self, url: impl Into<String>) -> Self {
        self.alpha_vantage_base_url = Some(url.into());
        self
    }

    pub fn news_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.news_api_base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = Some(delay);
        self
    }

    pub fn ticker_retries(mut self, retries: u32) -> Self {
        self.ticker_retries = Some(retries);
        self
    }

    pub fn news_page_size(mut self, size: u32) -> Self {
        self.news_page_size = Some(size);
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            openai_api_key: self.openai_api_key.unwrap_or(defaults.openai_api_key),
            alpha_vantage_api_key: self.alpha_vantage_api_key.unwrap_or(defaults.alpha_vantage_api_key),
            news_api_key: self.news_api_key.unwrap_or(defaults.news_api_key),
            openai_api_base: self.openai_api_base.unwrap_or(defaults.openai_api_base),
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            alpha_vantage_base_url: self.alpha_vantage_base_url.unwrap_or(defaults.alpha_vantage_base_url),
            news_api_base_url: self.news_api_base_url.unwrap_or(defaults.news_api_base_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            rate_limit_delay: self.rate_limit_delay.unwrap_or(defaults.rate_limit_delay),
            ticker_retries: self.ticker_retries.unwrap_or(defaults.ticker_retries),
            news_page_size: self.news_page_size.unwrap_or(defaults.news_page_size),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
        };

        config.validate()?;
        Ok(config)
    }
}
