//! term-chat - chat with an OpenAI model from the terminal
//!
//! A conversation store folds user prompts and completion results into
//! immutable snapshots; the terminal front end renders them as they change.

mod config;
mod llm;
mod repl;
mod runtime;
mod state_machine;

use clap::Parser;
use config::{ChatConfig, Cli};
use llm::{CompletionService, LoggingService, OpenAIService};
use runtime::{ChatStore, ServiceClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before tracing init so RUST_LOG may come from .env too
    let env_file = config::load_dotenv();

    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "term_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match env_file {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env"),
    }

    let config = ChatConfig::from_cli(Cli::parse())?;
    tracing::info!(
        model = %config.model.id,
        candidate_count = config.candidate_count,
        has_instructions = config.instructions.is_some(),
        "Configuration loaded"
    );

    let service = OpenAIService::new(
        config.api_key.clone(),
        config.model.id,
        config.base_url.as_deref(),
        config.timeout,
    )?;
    let service: Arc<dyn CompletionService> = Arc::new(LoggingService::new(Arc::new(service)));

    let store = ChatStore::spawn(ServiceClient::new(service), config.store_options());
    repl::run(store, config.model, config.candidate_count).await?;
    Ok(())
}
