//! Plain text generation on top of a chat provider

use crate::{CompletionRequest, LLMError, LLMProvider, Message, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// `(system prompt, user prompt) -> text`
///
/// This is all the summarizer and the advisor need from a model. No retry
/// happens at this level; a failed call is reported once to the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// A [`TextGenerator`] backed by a shared [`LLMProvider`]
///
/// Replies are trimmed; an empty reply is an error.
#[derive(Clone)]
pub struct ChatModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl ChatModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ChatModel {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = CompletionRequest::builder(&self.model)
            .system(system_prompt)
            .add_message(Message::user(user_prompt))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = self.provider.complete(request).await?;
        debug!(
            provider = self.provider.name(),
            tokens = response.usage.total(),
            "text generated"
        );

        match response.message.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(LLMError::UnexpectedResponse("model returned no text".to_string())),
        }
    }
}
