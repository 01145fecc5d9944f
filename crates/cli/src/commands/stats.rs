//! Stats command handler.
//!
//! Reports entry count, dimensions, and size of a saved index.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::VectorIndex;
use std::path::PathBuf;

/// Show statistics for a saved index
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Saved index to inspect (default: .docqa/index.sqlite)
    #[arg(short, long)]
    pub index: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index_path = self.index.clone().unwrap_or_else(|| config.index_path());
        let stats = VectorIndex::stats(&index_path)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index: {}", index_path.display());
            println!("Entries: {}", stats.entries);
            println!("Dimensions: {}", stats.dimensions);
            if let Some(created_at) = stats.created_at {
                println!("Created: {}", created_at.to_rfc3339());
            }
            println!("Size: {} bytes", stats.file_size_bytes);
        }

        Ok(())
    }
}
