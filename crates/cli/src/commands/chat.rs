//! Chat command handler.
//!
//! Interactive question-answering session with conversation memory.
//! Service failures are shown for the current question only; the session
//! and its memory survive them.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::{create_assistant, format_sources};

/// Interactive question-answering session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Saved index to load (default: .docqa/index.sqlite)
    #[arg(short, long)]
    pub index: Option<PathBuf>,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut assistant = create_assistant(config)?;

        let index_path = self.index.clone().unwrap_or_else(|| config.index_path());
        assistant.load_index(&index_path)?;

        println!("docqa chat - ask about your documents.");
        println!("Commands: /clear forgets the conversation, /quit exits.");
        println!();

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }

            match question {
                "/quit" | "/exit" => break,
                "/clear" => {
                    assistant.clear_memory();
                    println!("History cleared.");
                    continue;
                }
                _ => {}
            }

            let result = assistant
                .answer_streamed(question, |delta| {
                    print!("{}", delta);
                    std::io::stdout().flush().ok();
                })
                .await;

            match result {
                Ok(answer) => {
                    println!();
                    if let Some(sources) = format_sources(&answer.sources) {
                        println!("{}", sources);
                    }
                    println!();
                }
                Err(e) => {
                    println!();
                    println!(
                        "Sorry, I encountered an error while processing your question: {}",
                        e
                    );
                    println!();
                }
            }
        }

        Ok(())
    }
}
