//! Completion API abstraction
//!
//! Provides a common interface for chat completion providers.

mod error;
pub mod models;
mod openai;
mod types;

#[cfg(test)]
mod proptests;

pub use error::{LlmError, LlmErrorKind};
pub use models::{all_models, find_model, ModelDef};
pub use openai::{OpenAIService, DEFAULT_TIMEOUT};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Common interface for completion providers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Wraps a service and records the outcome and latency of every request
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let span = tracing::info_span!(
            "completion",
            model = %request.model,
            candidates = request.candidate_count,
            messages = request.messages.len(),
        );
        let started = Instant::now();
        let result = self.inner.complete(request).instrument(span.clone()).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        span.in_scope(|| match &result {
            Ok(completion) => tracing::info!(
                elapsed_ms,
                choices = completion.choices.len(),
                prompt_tokens = completion.usage.input_tokens,
                total_tokens = completion.usage.total(),
                "Completion received"
            ),
            Err(e) if e.kind.is_retryable() => tracing::warn!(
                elapsed_ms,
                kind = ?e.kind,
                retry_after_secs = ?e.retry_after.map(|d| d.as_secs()),
                error = %e,
                "Completion failed, may succeed if retried"
            ),
            Err(e) => tracing::error!(elapsed_ms, kind = ?e.kind, error = %e, "Completion failed"),
        });

        result
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
