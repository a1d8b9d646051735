//! Mimir error types

use std::time::Duration;

use crate::normalize::ParseError;
use crate::session::SessionStatus;

/// Mimir error types
#[derive(Debug, thiserror::Error)]
pub enum MimirError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("quota permanently exceeded: {0}")]
    QuotaExceeded(String),

    #[error("empty response from provider")]
    EmptyResponse,

    /// Every attempt against one provider failed with a retryable error.
    #[error("provider '{provider}' exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        provider: String,
        attempts: u32,
        last_error: Box<MimirError>,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unparseable completion: {0}")]
    Parse(#[from] ParseError),

    // Caller errors
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing prompt context field '{field}' for {kind} request")]
    MissingPromptField { kind: &'static str, field: &'static str },

    #[error("session '{session_id}' no longer accepts generation ({status})")]
    SessionClosed {
        session_id: String,
        status: SessionStatus,
    },

    // Configuration errors
    #[error("no provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Wrapped llm crate error
    #[error("LLM error: {0}")]
    Llm(String),
}

impl MimirError {
    /// Whether a retry of the same call may succeed.
    ///
    /// Throttling, timeouts, network failures and transient 5xx responses
    /// are retryable; everything else aborts the retry loop immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            MimirError::RateLimited { .. }
            | MimirError::Timeout(_)
            | MimirError::Http(_)
            | MimirError::EmptyResponse => true,
            MimirError::Api { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            MimirError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether this error indicates a bug in the calling layer rather than an
    /// operational condition. These are the only errors `generate` surfaces.
    pub fn is_fatal_request(&self) -> bool {
        matches!(
            self,
            MimirError::InvalidRequest(_) | MimirError::MissingPromptField { .. }
        )
    }

    /// Whether this is the terminal failure of a retry loop.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, MimirError::Exhausted { .. })
    }
}

impl From<llm::error::LLMError> for MimirError {
    fn from(err: llm::error::LLMError) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("rate limit") || lower.contains("429") {
            MimirError::RateLimited { retry_after: None }
        } else if lower.contains("authentication")
            || lower.contains("401")
            || lower.contains("invalid api key")
        {
            MimirError::AuthenticationFailed
        } else if lower.contains("quota") || lower.contains("insufficient") {
            MimirError::QuotaExceeded(msg)
        } else if lower.contains("timed out") || lower.contains("timeout") {
            MimirError::Timeout(Duration::ZERO)
        } else if lower.contains("connection") || lower.contains("http error") {
            MimirError::Http(msg)
        } else {
            MimirError::Llm(msg)
        }
    }
}

/// Result type alias for Mimir operations
pub type Result<T> = std::result::Result<T, MimirError>;
