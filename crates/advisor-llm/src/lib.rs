//! Text-generation layer for stock-advisor
//!
//! The advisor only needs two things from a language model:
//!
//! - a chat completion with tool calling, used by the reasoning loop that
//!   decides which pipeline actions to run
//! - a plain `(system prompt, user prompt) -> text` call, used by the
//!   summarizer and the advisor
//!
//! The first is the [`LLMProvider`] trait, the second is [`TextGenerator`].
//! [`ChatModel`] bridges the two so a single long-lived provider handle serves
//! both.

#[warn(missing_docs)]
pub mod completion;
pub mod error;
pub mod generator;
#[warn(missing_docs)]
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use generator::{ChatModel, TextGenerator};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;
