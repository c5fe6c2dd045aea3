//! Trait abstractions for runtime I/O
//!
//! The store loop only talks to the completion API through
//! [`CompletionClient`], so tests can drive it with mock implementations.

use crate::llm::{Completion, CompletionRequest, CompletionService, LlmError, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for requesting completions
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask for `candidate_count` alternative replies to `messages`
    async fn complete(
        &self,
        messages: &[Message],
        candidate_count: u8,
    ) -> Result<Completion, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(
        &self,
        messages: &[Message],
        candidate_count: u8,
    ) -> Result<Completion, LlmError> {
        (**self).complete(messages, candidate_count).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter to use a `CompletionService` as `CompletionClient`
pub struct ServiceClient {
    service: Arc<dyn CompletionService>,
    max_tokens: Option<u32>,
}

impl ServiceClient {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            max_tokens: None,
        }
    }

    /// Cap the length of each generated choice
    #[allow(dead_code)] // API completeness
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl CompletionClient for ServiceClient {
    async fn complete(
        &self,
        messages: &[Message],
        candidate_count: u8,
    ) -> Result<Completion, LlmError> {
        let request = CompletionRequest {
            model: self.service.model_id().to_string(),
            messages: messages.to_vec(),
            candidate_count,
            max_tokens: self.max_tokens,
        };
        self.service.complete(&request).await
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}
