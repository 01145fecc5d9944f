//! Prompt types.

use serde::{Deserialize, Serialize};

/// A fully assembled prompt, ready for the chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System instruction text
    pub system: String,

    /// Rendered user message (context + history + question)
    pub user: String,

    /// Number of context blocks included
    pub context_blocks: usize,

    /// Number of conversation turns included
    pub history_turns: usize,
}
