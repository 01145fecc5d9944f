//! docqa knowledge pipeline.
//!
//! Turns a JSON knowledge base into a queryable vector index and answers
//! questions over it: extraction, chunking, embeddings, retrieval,
//! conversation memory, and the assistant session that orchestrates them.

pub mod assistant;
pub mod chunker;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod memory;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use assistant::{DocAssistant, NOT_READY_MESSAGE};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use extract::{extract_content, load_knowledge_base};
pub use index::{IndexStats, VectorIndex};
pub use memory::ConversationMemory;
pub use retriever::Retriever;
pub use types::{
    Answer, AssistantOptions, BuildStats, Chunk, ConversationTurn, Document, RetrievedChunk,
    VectorEntry,
};
