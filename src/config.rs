//! Command-line and environment configuration

use crate::llm::models::{model_ids, DEFAULT_MODEL};
use crate::llm::{find_model, ModelDef, DEFAULT_TIMEOUT};
use crate::runtime::{StoreOptions, DEFAULT_CANDIDATE_COUNT};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Largest number of alternative replies the CLI will ask for
pub const MAX_CANDIDATE_COUNT: u8 = 3;

/// Fallback variable consulted when `API_KEY` is unset
const FALLBACK_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// CLI arguments for term-chat
#[derive(Parser, Debug)]
#[command(name = "term-chat")]
#[command(version, about = "Chat with an OpenAI model from the terminal")]
#[command(long_about = r"
Chat with an OpenAI model from the terminal.

Each prompt asks for several alternative replies. The preferred one is shown
and continues the conversation; switch to another with `/choose <n>`.

Every option can also be set through the environment variable shown with it,
or in a .env file. The API key falls back to OPENAI_API_KEY when API_KEY is
unset.
")]
pub struct Cli {
    /// API key for the completion endpoint
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model to chat with
    #[arg(short, long, env = "TERM_CHAT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// System instructions that open the conversation
    #[arg(short, long, env = "TERM_CHAT_INSTRUCTIONS")]
    pub instructions: Option<String>,

    /// Number of alternative replies to request per prompt (1-3)
    #[arg(short = 'n', long, env = "TERM_CHAT_CHOICES", default_value_t = DEFAULT_CANDIDATE_COUNT)]
    pub choices: u8,

    /// Endpoint root for OpenAI-compatible gateways
    #[arg(long, env = "OPENAI_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "TERM_CHAT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("No API key configured. Pass --api-key or set API_KEY")]
    MissingApiKey,

    #[error("Unknown model '{model}'. Available models: {available}")]
    UnknownModel { model: String, available: String },

    #[error("Choice count must be between 1 and 3, got {0}")]
    CandidateCount(u8),

    #[error("Timeout must be at least one second")]
    ZeroTimeout,
}

/// Load a `.env` file from the working directory or one of its parents into
/// the process environment. Variables that are already set keep their value.
///
/// Returns the file that was loaded, or `None` if there was none.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Resolved configuration
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: &'static ModelDef,
    pub instructions: Option<String>,
    pub candidate_count: u8,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl ChatConfig {
    /// Resolve and validate parsed arguments
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, std::env::var(FALLBACK_API_KEY_VAR).ok())
    }

    fn resolve(cli: Cli, fallback_api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = non_blank(cli.api_key)
            .or_else(|| non_blank(fallback_api_key))
            .ok_or(ConfigError::MissingApiKey)?;

        let model = find_model(cli.model.trim()).ok_or_else(|| ConfigError::UnknownModel {
            model: cli.model.clone(),
            available: model_ids(),
        })?;

        if !(1..=MAX_CANDIDATE_COUNT).contains(&cli.choices) {
            return Err(ConfigError::CandidateCount(cli.choices));
        }
        if cli.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            api_key,
            model,
            instructions: non_blank(cli.instructions),
            candidate_count: cli.choices,
            base_url: non_blank(cli.base_url),
            timeout: Duration::from_secs(cli.timeout_secs),
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            instructions: self.instructions.clone(),
            candidate_count: self.candidate_count,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model.id)
            .field("instructions", &self.instructions)
            .field("candidate_count", &self.candidate_count)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
