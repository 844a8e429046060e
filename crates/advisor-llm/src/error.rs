//! Error types for text generation

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors raised while talking to a language model
#[derive(Error, Debug)]
pub enum LLMError {
    /// Provider answered with a failure status
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Rejected credentials
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Provider-side throttling
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport failure (connect, timeout, body read)
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The provider answered but not in the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
