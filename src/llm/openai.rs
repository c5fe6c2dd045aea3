//! `OpenAI` and `OpenAI`-compatible chat completions provider

use super::types::{Choice, Completion, CompletionRequest, Message, MessageContent, Role, Usage};
use super::{CompletionService, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model_id: String,
    endpoint: String,
}

impl OpenAIService {
    pub fn new(
        api_key: String,
        model_id: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let endpoint = format!(
            "{}/chat/completions",
            base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/')
        );

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model_id: model_id.into(),
            endpoint,
        })
    }

    pub(super) fn translate_request(request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::translate_message).collect(),
            n: request.candidate_count,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    pub(super) fn translate_message(msg: &Message) -> OpenAIMessage {
        let content = match &msg.content {
            MessageContent::Text(text) => Some(serde_json::Value::String(text.clone())),
            MessageContent::Structured(serde_json::Value::Null) => None,
            MessageContent::Structured(value) => Some(value.clone()),
        };

        OpenAIMessage {
            role: msg.role,
            content,
        }
    }

    pub(super) fn normalize_response(resp: OpenAIResponse) -> Result<Completion, LlmError> {
        if resp.choices.is_empty() {
            return Err(LlmError::unknown("No choices in response"));
        }

        let mut choices: Vec<Choice> = resp
            .choices
            .into_iter()
            .map(|choice| {
                let content = match choice.message.content {
                    Some(serde_json::Value::String(text)) => MessageContent::Text(text),
                    Some(other) => MessageContent::Structured(other),
                    None => MessageContent::Structured(serde_json::Value::Null),
                };
                Choice {
                    index: choice.index,
                    message: Message::new(choice.message.role, content),
                }
            })
            .collect();
        choices.sort_by_key(|choice| choice.index);

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(Completion {
            id: resp.id,
            model: resp.model.unwrap_or_default(),
            choices,
            usage,
        })
    }

    /// Turn a non-success response into an error. Gateways often answer
    /// with HTML, so an unparseable body is kept verbatim.
    fn classify_failure(status: u16, body: &str, retry_after: Option<Duration>) -> LlmError {
        let detail = serde_json::from_str::<OpenAIErrorResponse>(body)
            .map_or_else(|_| body.trim().to_string(), |resp| resp.error.message);
        LlmError::http(status, &detail).with_retry_after(retry_after)
    }
}

#[async_trait]
impl CompletionService for OpenAIService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let openai_request = Self::translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_failure(status.as_u16(), &body, retry_after));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub n: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct OpenAIMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub index: usize,
    pub message: OpenAIMessage,
    #[allow(dead_code)] // Part of API response, not used
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
pub(super) struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
