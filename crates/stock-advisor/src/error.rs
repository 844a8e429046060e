//! Error taxonomy for the advisory pipeline
//!
//! Every failure is an [`AdvisorError`] with exactly one [`ErrorKind`]. The
//! rendered text is what the user (or the reasoning loop) sees, and it always
//! contains one of [`MARKERS`] so that text crossing the loop can still be
//! recognized as a failure by the next stage.

use advisor_llm::LLMError;
use std::fmt;
use thiserror::Error;

/// Substrings that identify a failed stage in rendered text
pub const MARKERS: [&str; 5] = [
    "Error",
    "No recent articles",
    "No matches found",
    "No intraday data",
    "No stock price data",
];

/// First marker contained in `text`, if any
pub fn detect_marker(text: &str) -> Option<&'static str> {
    MARKERS.iter().copied().find(|marker| text.contains(marker))
}

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller input
    Validation,
    /// Missing credential or bad setting
    Config,
    /// Unexpected response shape, status or content type
    Protocol,
    /// Malformed JSON
    Parse,
    Connectivity,
    Timeout,
    /// Provider throttling
    RateLimit,
    /// Legitimately empty result
    NotFound,
    /// Model output failed a post-condition
    Format,
    /// A previous stage already failed, or the model call itself did
    Upstream,
}

impl ErrorKind {
    /// Only transport failures and throttling are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Connectivity | Self::Timeout | Self::RateLimit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::Config => "ConfigError",
            Self::Protocol => "ProtocolError",
            Self::Parse => "ParseError",
            Self::Connectivity => "ConnectivityError",
            Self::Timeout => "TimeoutError",
            Self::RateLimit => "RateLimitError",
            Self::NotFound => "NotFoundError",
            Self::Format => "FormatError",
            Self::Upstream => "UpstreamError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage that consumes an earlier result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summarize,
    Advise,
    /// The reasoning loop itself
    Agent,
}

impl Stage {
    fn action(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Advise => "provide advice",
            Self::Agent => "run agent",
        }
    }

    fn activity(self) -> &'static str {
        match self {
            Self::Summarize => "summarizing",
            Self::Advise => "providing advice",
            Self::Agent => "running agent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Advisory pipeline errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Error: {0}")]
    Validation(String),

    #[error("Error: {0}")]
    Config(String),

    #[error("Error: {0}")]
    Protocol(String),

    #[error("Error: Failed to parse JSON response: {detail}. Response: {excerpt}")]
    Parse { detail: String, excerpt: String },

    #[error("Error: Failed to connect to {provider} API.")]
    Connectivity { provider: &'static str },

    #[error("Error: Request to {provider} API timed out.")]
    Timeout { provider: &'static str },

    #[error("Error: {0}")]
    RateLimit(String),

    /// Message already carries its own marker ("No matches found ...")
    #[error("{0}")]
    NotFound(String),

    #[error("Error: {0}")]
    Format(String),

    /// Ticker lookup failed inside the intraday fetch
    #[error("No stock price data found for {company}: {source}")]
    TickerUnresolved {
        company: String,
        #[source]
        source: Box<AdvisorError>,
    },

    /// Input already encodes a failure from an earlier stage
    #[error("Cannot {stage}: {message}")]
    Upstream { stage: Stage, message: String },

    /// The text-generation call failed
    #[error("Error {}: {source}", .stage.activity())]
    Model {
        stage: Stage,
        #[source]
        source: LLMError,
    },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl AdvisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Config,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RateLimit(_) => ErrorKind::RateLimit,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Format(_) => ErrorKind::Format,
            Self::TickerUnresolved { source, .. } => source.kind(),
            Self::Upstream { .. } | Self::Model { .. } => ErrorKind::Upstream,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Wrap a failed or failure-bearing input for `stage`
    pub fn upstream(stage: Stage, message: impl fmt::Display) -> Self {
        Self::Upstream {
            stage,
            message: message.to_string(),
        }
    }

    pub fn model(stage: Stage, source: LLMError) -> Self {
        Self::Model { stage, source }
    }
}
