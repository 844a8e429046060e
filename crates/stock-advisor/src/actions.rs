//! The closed set of actions the reasoning loop may call

use crate::error::{AdvisorError, Result};
use advisor_llm::ToolDefinition;
use advisor_llm::tools::schema;
use serde_json::{Value, json};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    FetchNews,
    FetchIntraday,
    Summarize,
    Advise,
}

impl ActionKind {
    pub const ALL: [Self; 4] = [Self::FetchNews, Self::FetchIntraday, Self::Summarize, Self::Advise];

    /// Stable tool name exposed to the model
    pub fn name(self) -> &'static str {
        match self {
            Self::FetchNews => "fetch_news",
            Self::FetchIntraday => "fetch_intraday",
            Self::Summarize => "summarize",
            Self::Advise => "advise",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FetchNews => {
                "Fetch the 5 most recent English news headlines about a company. Input: the company name."
            }
            Self::FetchIntraday => {
                "Resolve a company's ticker symbol and fetch its latest 5-minute intraday price, change and volume. Input: the company name."
            }
            Self::Summarize => {
                "Summarize news headlines and intraday stock data into exactly 3 financial takeaways. Input: the text returned by fetch_news and by fetch_intraday."
            }
            Self::Advise => {
                "Recommend Buy, Hold, or Sell with a 2-line justification. Input: the summary returned by summarize."
            }
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            Self::FetchNews | Self::FetchIntraday => schema::object(
                json!({ "company": schema::string("Company name, e.g. Tesla") }),
                &["company"],
            ),
            Self::Summarize => schema::object(
                json!({
                    "news": schema::string("Output of fetch_news"),
                    "market": schema::string("Output of fetch_intraday"),
                }),
                &["news", "market"],
            ),
            Self::Advise => schema::object(
                json!({ "summary": schema::string("Output of summarize") }),
                &["summary"],
            ),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tool definitions for every action, in a stable order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ActionKind::ALL.into_iter().map(ActionKind::definition).collect()
}

/// A requested action with its typed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FetchNews { company: String },
    FetchIntraday { company: String },
    Summarize { news: String, market: String },
    Advise { summary: String },
}

impl Action {
    /// Parse a tool call. Fetch actions also take a bare string as the
    /// company name.
    pub fn from_call(name: &str, input: &Value) -> Result<Self> {
        let kind = ActionKind::from_name(name).ok_or_else(|| {
            AdvisorError::Validation(format!(
                "Unknown action '{name}'. Available actions: fetch_news, fetch_intraday, summarize, advise."
            ))
        })?;

        Ok(match kind {
            ActionKind::FetchNews => Self::FetchNews {
                company: company_arg(kind, input)?,
            },
            ActionKind::FetchIntraday => Self::FetchIntraday {
                company: company_arg(kind, input)?,
            },
            ActionKind::Summarize => Self::Summarize {
                news: string_arg(kind, input, "news")?,
                market: string_arg(kind, input, "market")?,
            },
            ActionKind::Advise => Self::Advise {
                summary: string_arg(kind, input, "summary")?,
            },
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::FetchNews { .. } => ActionKind::FetchNews,
            Self::FetchIntraday { .. } => ActionKind::FetchIntraday,
            Self::Summarize { .. } => ActionKind::Summarize,
            Self::Advise { .. } => ActionKind::Advise,
        }
    }
}

fn company_arg(kind: ActionKind, input: &Value) -> Result<String> {
    match input {
        Value::String(company) => Ok(company.clone()),
        _ => string_arg(kind, input, "company"),
    }
}

fn string_arg(kind: ActionKind, input: &Value, key: &str) -> Result<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AdvisorError::Validation(format!("Invalid input for {kind}: missing string field '{key}'."))
        })
}

/// Text handed back to the loop after running an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ActionOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(err: &AdvisorError) -> Self {
        Self {
            text: err.to_string(),
            is_error: true,
        }
    }
}

impl<T: fmt::Display> From<Result<T>> for ActionOutcome {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::success(value.to_string()),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, detect_marker};

    #[test]
    fn test_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ActionKind::from_name("buy_stock"), None);
    }

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["fetch_news", "fetch_intraday", "summarize", "advise"]);
        assert_eq!(tools[2].input_schema["required"], json!(["news", "market"]));
        assert!(tools.iter().all(|t| !t.description.is_empty()));
    }

    #[test]
    fn test_from_call() {
        assert_eq!(
            Action::from_call("fetch_news", &json!({ "company": "Tesla" })).unwrap(),
            Action::FetchNews {
                company: "Tesla".into()
            }
        );
        assert_eq!(
            Action::from_call("fetch_intraday", &json!("Tesla")).unwrap(),
            Action::FetchIntraday {
                company: "Tesla".into()
            }
        );
        assert_eq!(
            Action::from_call("advise", &json!({ "summary": "- a" })).unwrap().kind(),
            ActionKind::Advise
        );
    }

    #[test]
    fn test_bad_calls_are_validation_errors() {
        let err = Action::from_call("trade", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Unknown action 'trade'"));

        let err = Action::from_call("summarize", &json!({ "news": "n" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid input for summarize: missing string field 'market'."
        );

        assert!(Action::from_call("advise", &json!("- a")).is_err());
    }

    #[test]
    fn test_failed_outcome_keeps_marker() {
        let outcome = ActionOutcome::from(Err::<String, _>(AdvisorError::NotFound(
            "No recent articles found for Acme.".into(),
        )));
        assert!(outcome.is_error);
        assert_eq!(detect_marker(&outcome.text), Some("No recent articles"));
    }
}
