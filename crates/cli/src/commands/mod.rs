//! Command handlers for the docqa CLI.

mod ask;
mod build;
mod chat;
mod stats;

pub use ask::AskCommand;
pub use build::BuildCommand;
pub use chat::ChatCommand;
pub use stats::StatsCommand;

use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{AssistantOptions, DocAssistant, EmbeddingConfig};

/// Wire up an assistant session from the application configuration.
pub(crate) fn create_assistant(config: &AppConfig) -> AppResult<DocAssistant> {
    let api_key = config.resolve_api_key();

    let embedding_config = EmbeddingConfig {
        provider: config.provider.clone(),
        model: config.embedding_model.clone(),
        dimensions: config.embedding_dimensions,
    };
    let embeddings = docqa_knowledge::create_provider(&embedding_config, api_key.as_deref())?;

    let chat = docqa_llm::create_client(&config.provider, None, api_key.as_deref())?;

    let mut options = AssistantOptions::from_config(config);
    options.prompt_template = docqa_prompt::load_template(&config.workspace)?;

    DocAssistant::new(options, embeddings, chat)
}

/// Format the first few sources for display, the way the transcript shows them.
pub(crate) fn format_sources(sources: &[String]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }

    let shown: Vec<_> = sources.iter().take(3).cloned().collect();
    Some(format!("Sources: {}", shown.join(", ")))
}
