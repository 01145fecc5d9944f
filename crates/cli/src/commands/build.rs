//! Build command handler.
//!
//! Ingests a JSON knowledge base, builds the vector index, and saves it.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

use super::create_assistant;

/// Build a vector index from a JSON knowledge base
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Path to the JSON knowledge base file
    pub knowledge_base: PathBuf,

    /// Where to save the built index (default: .docqa/index.sqlite)
    #[arg(short, long)]
    pub index: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    /// Execute the build command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Building index from {:?}", self.knowledge_base);

        let mut assistant = create_assistant(config)?;

        let documents = assistant.load_documents(&self.knowledge_base)?;
        let stats = assistant.build_index(&documents).await?;

        let index_path = self.index.clone().unwrap_or_else(|| config.index_path());
        assistant.save_index(&index_path)?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunks": stats.chunks,
                "entries": stats.entries,
                "durationSecs": stats.duration_secs,
                "index": index_path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks) in {:.2}s -> {}",
                stats.documents,
                stats.chunks,
                stats.duration_secs,
                index_path.display()
            );
        }

        Ok(())
    }
}
