//! Ask for a company name and print a Buy/Hold/Sell recommendation

use advisor_llm::ChatModel;
use advisor_llm::providers::{OpenAIConfig, OpenAIProvider};
use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use stock_advisor::{AdvisorConfig, AdvisorError, Orchestrator, Pipeline, ReqwestTransport, goal_prompt};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stock-advisor", version)]
#[command(
    about = "Summarize a company's news and intraday prices into a Buy/Hold/Sell recommendation",
    long_about = "Prompts for a company name, then lets a language model fetch recent headlines \
                  (NewsAPI) and intraday prices (Alpha Vantage), summarize them and recommend \
                  Buy, Hold, or Sell.\n\nRequires OPENAI_API_KEY, ALPHA_VANTAGE_API_KEY and \
                  NEWSAPI_API_KEY in the environment or a .env file."
)]
struct Cli {}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,stock_advisor=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_company() -> anyhow::Result<String> {
    let mut stdout = io::stdout();
    print!("Enter a company name: ");
    stdout.flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("failed to read company name")?;
    Ok(input.trim().to_string())
}

async fn advise(config: &AdvisorConfig, company: &str) -> stock_advisor::Result<String> {
    if company.is_empty() {
        return Err(AdvisorError::Validation("Company name must be a non-empty string.".to_string()));
    }

    let openai = OpenAIConfig::new(config.openai_api_key.clone()).with_api_base(config.openai_api_base.clone());
    let provider = Arc::new(
        OpenAIProvider::with_config(openai).map_err(|e| AdvisorError::Config(e.to_string()))?,
    );
    let model = ChatModel::new(provider.clone(), config.model.clone())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);

    let pipeline = Pipeline::from_config(config, transport, Arc::new(model));
    let orchestrator = Orchestrator::new(provider, pipeline, config);
    orchestrator.run(&goal_prompt(company)?).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let _cli = Cli::parse();

    let config = AdvisorConfig::from_env()?;
    info!(model = %config.model, "configuration loaded");

    let company = read_company()?;
    let answer = match advise(&config, &company).await {
        Ok(answer) => answer,
        Err(err) => {
            error!(kind = %err.kind(), "advice failed");
            err.to_string()
        }
    };

    println!("\n Final Advice:\n {answer}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_company_fails_before_any_client_is_built() {
        let config = AdvisorConfig::builder()
            .openai_api_key("sk-test")
            .alpha_vantage_api_key("av")
            .news_api_key("na")
            .build()
            .unwrap();

        let err = advise(&config, "").await.unwrap_err();
        assert_eq!(err.to_string(), "Error: Company name must be a non-empty string.");
    }
}
