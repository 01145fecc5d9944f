//! Ask command handler.
//!
//! Answers a single question against a saved index.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

use super::{create_assistant, format_sources};

/// Ask a single question against a saved index
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Saved index to load (default: .docqa/index.sqlite)
    #[arg(short, long)]
    pub index: Option<PathBuf>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.retrieval_k = top_k;
        }
        config.validate()?;

        let mut assistant = create_assistant(&config)?;

        let index_path = self.index.clone().unwrap_or_else(|| config.index_path());
        assistant.load_index(&index_path)?;

        let answer = assistant.answer(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.text,
                "sources": answer.sources,
                "model": config.chat_model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.text);
            if let Some(sources) = format_sources(&answer.sources) {
                println!();
                println!("{}", sources);
            }
        }

        Ok(())
    }
}
