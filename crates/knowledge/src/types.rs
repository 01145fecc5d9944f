//! Knowledge system type definitions.

use docqa_core::config::AppConfig;
use serde::{Deserialize, Serialize};

/// Extracted flat text with a back-reference to its source record.
///
/// Invariant: `content` is non-empty; empty extractions are dropped by the
/// loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Flattened text content
    pub content: String,

    /// Identifier of the source record (array index or object key)
    pub source_id: String,
}

/// A bounded text segment produced from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content (at most the configured chunk size, in characters)
    pub text: String,

    /// Source document identifier
    pub source_id: String,

    /// Position within the source document
    pub position: u32,
}

/// A chunk paired with its embedding vector.
///
/// Owned exclusively by the vector index once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Embedding vector
    pub vector: Vec<f32>,

    /// Chunk text
    pub text: String,

    /// Source document identifier
    pub source_id: String,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub score: f32,
}

/// The assistant's reply to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub text: String,

    /// Distinct source identifiers used, in retrieval order
    pub sources: Vec<String>,
}

/// One (question, answer) exchange held in conversation memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of documents ingested
    pub documents: usize,

    /// Number of chunks produced
    pub chunks: usize,

    /// Number of entries in the built index
    pub entries: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Pipeline options for an assistant session.
#[derive(Debug, Clone)]
pub struct AssistantOptions {
    /// Chat model identifier
    pub chat_model: String,

    /// Sampling temperature for answer generation
    pub temperature: f32,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    pub retrieval_k: usize,

    /// Conversation memory window (turns)
    pub memory_window: usize,

    /// Optional user-message template override
    pub prompt_template: Option<String>,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            chat_model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            chunk_size: 1000,
            chunk_overlap: 100,
            retrieval_k: 4,
            memory_window: 5,
            prompt_template: None,
        }
    }
}

impl AssistantOptions {
    /// Derive session options from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chat_model: config.chat_model.clone(),
            temperature: config.temperature,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            retrieval_k: config.retrieval_k,
            memory_window: config.memory_window,
            prompt_template: None,
        }
    }
}
