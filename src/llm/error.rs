//! Completion API failures

use std::time::Duration;
use thiserror::Error;

/// A failed completion request
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// Server-requested delay, from a `Retry-After` header
    pub retry_after: Option<Duration>,
}

/// Coarse failure class. The store treats every kind alike; it only shows
/// up in logs and in the rendered error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Timeouts, refused connections, truncated bodies
    Network,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401, 403
    Auth,
    /// 400
    InvalidRequest,
    Unknown,
}

impl LlmError {
    fn new(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            retry_after: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message.into())
    }

    /// Non-success HTTP response. `detail` is the provider's own error
    /// text when it sent one, otherwise the raw body.
    pub fn http(status: u16, detail: &str) -> Self {
        let (kind, message) = match status {
            401 | 403 => (
                LlmErrorKind::Auth,
                format!("Authentication failed: {detail}"),
            ),
            429 => (
                LlmErrorKind::RateLimit,
                format!("Rate limit exceeded: {detail}"),
            ),
            400 => (
                LlmErrorKind::InvalidRequest,
                format!("Invalid request: {detail}"),
            ),
            500..=599 => (
                LlmErrorKind::ServerError,
                format!("Server error ({status}): {detail}"),
            ),
            _ => (LlmErrorKind::Unknown, format!("HTTP {status}: {detail}")),
        };
        Self::new(kind, message)
    }

    pub fn with_retry_after(mut self, delay: Option<Duration>) -> Self {
        self.retry_after = delay;
        self
    }
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
