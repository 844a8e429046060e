//! LLM provider trait

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A chat-completion backend
///
/// Implementations own their HTTP client and credentials; callers share one
/// instance behind an `Arc` for the life of the process.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one completion round trip
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider name for logs (e.g. "openai")
    fn name(&self) -> &str;
}
