//! Prompt templates for the model-backed stages
//!
//! Templates are MiniJinja strings with named placeholders, rendered with a
//! fresh environment per call.

use crate::error::{AdvisorError, Result};
use minijinja::{Environment, context};

pub const SUMMARIZER_SYSTEM: &str =
    "You are an investment analyst. Summarize into exactly 3 financial takeaways as bullet points.";

pub const ADVISOR_SYSTEM: &str = "You are an investment analyst.";

const SUMMARIZER_USER: &str = "News:\n{{ news_text }}\n\nStock Data:\n{{ stock_data }}";

const ADVISOR_USER: &str = "Based on this summary, should the investor Buy, Hold, or Sell? \
Provide a 2-line reason justifying your decision\nSummary: {{ summary }}";

const GOAL: &str =
    "Analyze {{ company }}, fetch its intraday stock data and news, and tell me if I should invest.";

fn render(template: &str, ctx: minijinja::Value) -> Result<String> {
    let env = Environment::new();
    env.render_str(template, ctx)
        .map_err(|e| AdvisorError::Config(format!("prompt template error: {e}")))
}

/// User message asking for the three takeaways
pub fn summarizer_prompt(news_text: &str, stock_data: &str) -> Result<String> {
    render(SUMMARIZER_USER, context! { news_text, stock_data })
}

pub fn advisor_prompt(summary: &str) -> Result<String> {
    render(ADVISOR_USER, context! { summary })
}

/// Goal handed to the reasoning loop for one company
pub fn goal_prompt(company: &str) -> Result<String> {
    render(GOAL, context! { company => company.trim() })
}
