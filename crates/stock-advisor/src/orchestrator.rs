//! Reasoning loop over the pipeline actions
//!
//! The loop follows the usual agent pattern:
//! 1. Send the conversation and the action definitions to the model
//! 2. On a tool-use stop, run each requested action in order and append the
//!    results
//! 3. On a natural stop, return the model's text
//!
//! Which actions run, and in what order, is decided entirely by the model.
//! Action failures are handed back to it as error results, never raised.

use crate::actions::{Action, ActionOutcome, tool_definitions};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result, Stage};
use crate::pipeline::Pipeline;
use advisor_llm::{CompletionRequest, ContentBlock, LLMProvider, Message, StopReason};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a financial advisory agent. Use the available actions to fetch \
recent news and intraday stock data for the company, summarize them, and give a Buy, Hold, or Sell \
recommendation. Pass each action's output unchanged as the input of the next one. If an action \
returns an error, report it instead of continuing.";

/// Returned when the iteration cap is hit
pub const MAX_ITERATIONS_MESSAGE: &str = "Max iterations reached without completion";

const PREVIEW_CHARS: usize = 200;

/// One executed action
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: String,
    pub input: Value,
    pub output: String,
    pub is_error: bool,
    pub duration_ms: u64,
}

/// Final answer and the actions that led to it
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub answer: String,
    pub steps: Vec<Step>,
}

pub struct Orchestrator {
    provider: Arc<dyn LLMProvider>,
    pipeline: Pipeline,
    model: String,
    temperature: f32,
    max_tokens: usize,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>, pipeline: Pipeline, config: &AdvisorConfig) -> Self {
        Self {
            provider,
            pipeline,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_iterations,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn run(&self, goal: &str) -> Result<String> {
        Ok(self.run_traced(goal).await?.answer)
    }

    /// Run the loop for `goal`, recording every executed action
    #[instrument(skip(self))]
    pub async fn run_traced(&self, goal: &str) -> Result<Run> {
        let mut conversation = vec![Message::user(goal)];
        let mut steps = Vec::new();

        for iteration in 1..=self.max_iterations {
            info!(iteration, max_iterations = self.max_iterations, "agent iteration started");

            let request = CompletionRequest::builder(&self.model)
                .messages(conversation.clone())
                .system(SYSTEM_PROMPT)
                .max_tokens(self.max_tokens)
                .temperature(self.temperature)
                .tools(tool_definitions())
                .build();

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| AdvisorError::model(Stage::Agent, e))?;

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "model response received"
            );

            let text = response.message.text().unwrap_or_default().to_string();
            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::EndTurn | StopReason::StopSequence => {
                    info!(iteration, steps = steps.len(), "agent completed");
                    return Ok(Run { answer: text, steps });
                }
                StopReason::MaxTokens => {
                    warn!("model hit the token limit");
                    let answer = if text.trim().is_empty() {
                        "Response truncated due to token limit".to_string()
                    } else {
                        text
                    };
                    return Ok(Run { answer, steps });
                }
                StopReason::ToolUse => {
                    let results = self.execute_calls(&response.message, &mut steps).await;
                    if results.is_empty() {
                        warn!("tool-use stop without any tool calls");
                        return Ok(Run { answer: text, steps });
                    }
                    conversation.extend(results);
                }
            }
        }

        warn!(max_iterations = self.max_iterations, "max iterations reached, stopping");
        Ok(Run {
            answer: MAX_ITERATIONS_MESSAGE.to_string(),
            steps,
        })
    }

    /// Run every tool call of `message` in order, returning result messages
    async fn execute_calls(&self, message: &Message, steps: &mut Vec<Step>) -> Vec<Message> {
        let mut results = Vec::new();

        for call in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = call else {
                continue;
            };

            let started = Instant::now();
            let outcome = match Action::from_call(name, input) {
                Ok(action) => {
                    info!(action = %action.kind(), id = %id, "executing action");
                    self.pipeline.dispatch(&action).await
                }
                Err(err) => {
                    warn!(action = %name, error = %err, "rejected action call");
                    ActionOutcome::failure(&err)
                }
            };
            let duration_ms = started.elapsed().as_millis() as u64;

            let preview: String = outcome.text.chars().take(PREVIEW_CHARS).collect();
            debug!(action = %name, duration_ms, is_error = outcome.is_error, preview = %preview, "action finished");

            results.push(Message::tool_result(id.clone(), outcome.text.clone(), outcome.is_error));
            steps.push(Step {
                action: name.clone(),
                input: input.clone(),
                output: outcome.text,
                is_error: outcome.is_error,
                duration_ms,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::prompts::goal_prompt;
    use crate::testing::{
        MockGenerator, ScriptedProvider, ScriptedTransport, completion, intraday, news, symbol_search, test_config,
    };
    use advisor_llm::LLMError;
    use async_trait::async_trait;
    use serde_json::json;

    fn tool_call(id: &str, name: &str, input: Value) -> Message {
        Message::assistant_blocks(vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }])
    }

    fn orchestrator(
        provider: Arc<dyn LLMProvider>,
        transport: Arc<ScriptedTransport>,
        generator: MockGenerator,
    ) -> Orchestrator {
        let config = test_config();
        let pipeline = Pipeline::from_config(&config, transport, Arc::new(generator));
        Orchestrator::new(provider, pipeline, &config)
    }

    fn idle_generator() -> MockGenerator {
        let mut mock = MockGenerator::new();
        mock.expect_generate().times(0);
        mock
    }

    #[tokio::test]
    async fn test_full_run_chains_action_outputs() {
        const SUMMARY: &str = "- a\n- b\n- c";
        let news_text = "Recent news on Tesla:\nTesla recalls 2M vehicles (Reuters)";
        let market_text = "Intraday stock data for Tesla (TSLA) at 2024-05-01 16:00:00:\n\
                           - Close Price: $250.00\n\
                           - Change: $5.00 (2.04%)\n\
                           - Volume: 1200";

        let provider = ScriptedProvider::new(vec![
            completion(tool_call("c1", "fetch_news", json!({ "company": "Tesla" })), StopReason::ToolUse),
            completion(tool_call("c2", "fetch_intraday", json!("Tesla")), StopReason::ToolUse),
            completion(
                tool_call("c3", "summarize", json!({ "news": news_text, "market": market_text })),
                StopReason::ToolUse,
            ),
            completion(tool_call("c4", "advise", json!({ "summary": SUMMARY })), StopReason::ToolUse),
            completion(Message::assistant("Buy. Deliveries are strong."), StopReason::EndTurn),
        ]);
        let transport = ScriptedTransport::new(vec![
            Ok(news(&[("Tesla recalls 2M vehicles", "Reuters")])),
            Ok(symbol_search(&["TSLA"])),
            Ok(intraday(&[
                ("2024-05-01 15:55:00", "245.0000", "900"),
                ("2024-05-01 16:00:00", "250.0000", "1200"),
            ])),
        ]);
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .times(2)
            .returning(|system, _| {
                if system.contains("3 financial takeaways") {
                    Ok(SUMMARY.to_string())
                } else {
                    Ok("Buy. Deliveries are strong.".to_string())
                }
            });

        let orchestrator = orchestrator(provider.clone(), transport, generator);
        let run = orchestrator.run_traced(&goal_prompt("Tesla").unwrap()).await.unwrap();

        assert_eq!(run.answer, "Buy. Deliveries are strong.");
        let actions: Vec<&str> = run.steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, ["fetch_news", "fetch_intraday", "summarize", "advise"]);
        assert!(run.steps.iter().all(|s| !s.is_error));
        assert_eq!(run.steps[0].output, news_text);
        assert_eq!(run.steps[1].output, market_text);

        let requests = provider.requests();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(4));
        assert_eq!(requests[4].messages.len(), 9);
    }

    #[tokio::test]
    async fn test_failed_action_is_returned_to_the_model() {
        let provider = ScriptedProvider::new(vec![
            completion(tool_call("c1", "fetch_news", json!({ "company": "Acme" })), StopReason::ToolUse),
            completion(
                Message::assistant("No recent articles found for Acme."),
                StopReason::EndTurn,
            ),
        ]);
        let transport = ScriptedTransport::new(vec![Ok(news(&[]))]);

        let orchestrator = orchestrator(provider.clone(), transport, idle_generator());
        let run = orchestrator.run_traced("Analyze Acme").await.unwrap();

        assert!(run.steps[0].is_error);
        assert_eq!(run.steps[0].output, "No recent articles found for Acme.");

        let requests = provider.requests();
        let last = requests[1].messages.last().unwrap();
        assert_eq!(
            last,
            &Message::tool_result("c1", "No recent articles found for Acme.", true)
        );
    }

    #[tokio::test]
    async fn test_unknown_action_becomes_error_result() {
        let provider = ScriptedProvider::new(vec![
            completion(tool_call("c1", "place_order", json!({ "qty": 10 })), StopReason::ToolUse),
            completion(Message::assistant("Cannot trade."), StopReason::EndTurn),
        ]);

        let orchestrator = orchestrator(provider, ScriptedTransport::new(vec![]), idle_generator());
        let run = orchestrator.run_traced("Buy Tesla for me").await.unwrap();

        assert_eq!(run.answer, "Cannot trade.");
        assert!(run.steps[0].is_error);
        assert!(run.steps[0].output.starts_with("Error: Unknown action 'place_order'"));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let looping = (0..10)
            .map(|i| {
                completion(
                    tool_call(&format!("c{i}"), "fetch_news", json!({ "company": "" })),
                    StopReason::ToolUse,
                )
            })
            .collect();
        let provider = ScriptedProvider::new(looping);

        let orchestrator = orchestrator(provider.clone(), ScriptedTransport::new(vec![]), idle_generator());
        let run = orchestrator.run_traced("Analyze").await.unwrap();

        assert_eq!(run.answer, MAX_ITERATIONS_MESSAGE);
        assert_eq!(run.steps.len(), 10);
        assert_eq!(provider.requests().len(), 10);
    }

    #[tokio::test]
    async fn test_max_tokens_returns_partial_text() {
        let provider = ScriptedProvider::new(vec![completion(
            Message::assistant("Hold, because"),
            StopReason::MaxTokens,
        )]);

        let orchestrator = orchestrator(provider, ScriptedTransport::new(vec![]), idle_generator());
        assert_eq!(orchestrator.run("Analyze Tesla").await.unwrap(), "Hold, because");
    }

    struct FailingProvider;

    #[async_trait]
    impl LLMProvider for FailingProvider {
        async fn complete(&self, _request: CompletionRequest) -> advisor_llm::Result<advisor_llm::CompletionResponse> {
            Err(LLMError::AuthenticationFailed)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream_error() {
        let orchestrator = orchestrator(Arc::new(FailingProvider), ScriptedTransport::new(vec![]), idle_generator());
        let err = orchestrator.run("Analyze Tesla").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(
            err.to_string(),
            "Error running agent: Invalid API key or authentication failed"
        );
    }
}
