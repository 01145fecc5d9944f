//! docqa prompt assembly.
//!
//! Renders the retrieval-augmented answering prompt: a fixed system
//! instruction plus retrieved context, conversation history, and the
//! current question.

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::{build_rag_prompt, DEFAULT_USER_TEMPLATE, SYSTEM_INSTRUCTION};
pub use loader::load_template;
pub use types::BuiltPrompt;
