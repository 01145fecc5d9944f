//! The document question-answering session.
//!
//! `DocAssistant` wires the pipeline together: load documents, build or load
//! a vector index, and answer questions with retrieval-augmented generation
//! while keeping a bounded conversation memory. Dependencies (embedding
//! provider, chat client) are injected at construction; one assistant serves
//! one conversation session.

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::extract;
use crate::index::VectorIndex;
use crate::memory::ConversationMemory;
use crate::retriever::Retriever;
use crate::types::{Answer, AssistantOptions, BuildStats, Document, RetrievedChunk, VectorEntry};
use docqa_core::{AppError, AppResult};
use docqa_llm::{ChatClient, ChatRequest};
use docqa_prompt::build_rag_prompt;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Fixed reply returned while no index has been built or loaded.
///
/// The chat service is never invoked for it.
pub const NOT_READY_MESSAGE: &str =
    "Sorry, the knowledge base is not loaded yet. Please build or load an index first.";

/// A per-session assistant with injected dependencies.
///
/// The index has two states: `None` (unbuilt, questions get the not-ready
/// reply) and `Some` (built, questions go through retrieval). A failed
/// build or load leaves the previous state untouched. `&mut self`
/// receivers serialize builds against queries within a session.
pub struct DocAssistant {
    options: AssistantOptions,
    embeddings: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatClient>,
    index: Option<VectorIndex>,
    memory: ConversationMemory,
}

enum Prepared {
    NotReady,
    Ready {
        request: ChatRequest,
        sources: Vec<String>,
    },
}

impl DocAssistant {
    /// Create a new assistant session.
    pub fn new(
        options: AssistantOptions,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatClient>,
    ) -> AppResult<Self> {
        if options.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if options.chunk_overlap >= options.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                options.chunk_overlap, options.chunk_size
            )));
        }
        if options.retrieval_k == 0 {
            return Err(AppError::Config("retrieval_k must be positive".to_string()));
        }
        if options.memory_window == 0 {
            return Err(AppError::Config(
                "memory_window must be positive".to_string(),
            ));
        }

        let memory = ConversationMemory::new(options.memory_window);

        tracing::info!(
            "Assistant session created (embeddings: {}, chat: {})",
            embeddings.provider_name(),
            chat.provider_name()
        );

        Ok(Self {
            options,
            embeddings,
            chat,
            index: None,
            memory,
        })
    }

    /// Whether an index is available for retrieval.
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    /// Load a JSON knowledge base into documents.
    pub fn load_documents(&self, path: &Path) -> AppResult<Vec<Document>> {
        extract::load_knowledge_base(path)
    }

    /// Build a fresh index from documents: chunk, embed, index.
    ///
    /// Any prior index stays visible until the new one is fully built; a
    /// failure at any stage leaves the previous state untouched.
    pub async fn build_index(&mut self, documents: &[Document]) -> AppResult<BuildStats> {
        let start = Instant::now();

        if documents.is_empty() {
            return Err(AppError::Ingestion(
                "knowledge base produced no documents".to_string(),
            ));
        }

        let chunks = chunker::chunk_documents(
            documents,
            self.options.chunk_size,
            self.options.chunk_overlap,
        )?;

        if chunks.is_empty() {
            return Err(AppError::Ingestion(
                "knowledge base produced no chunks".to_string(),
            ));
        }

        tracing::info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::Service(format!(
                "embedding service returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let entries: Vec<VectorEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorEntry {
                vector,
                text: chunk.text,
                source_id: chunk.source_id,
            })
            .collect();

        let index = VectorIndex::build(entries)?;

        let stats = BuildStats {
            documents: documents.len(),
            chunks: texts.len(),
            entries: index.len(),
            duration_secs: start.elapsed().as_secs_f64(),
        };

        self.index = Some(index);

        tracing::info!(
            "Index built: {} documents, {} chunks in {:.2}s",
            stats.documents,
            stats.chunks,
            stats.duration_secs
        );

        Ok(stats)
    }

    /// Persist the current index.
    pub fn save_index(&self, path: &Path) -> AppResult<()> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| AppError::NotReady("no index to save".to_string()))?;
        index.save(path)
    }

    /// Replace the current index with one loaded from disk.
    ///
    /// A failed load leaves the previous state untouched.
    pub fn load_index(&mut self, path: &Path) -> AppResult<()> {
        let index = VectorIndex::load(path)?;
        self.index = Some(index);
        Ok(())
    }

    /// Answer a question with retrieval-augmented generation.
    ///
    /// Returns the generated text plus the distinct source ids of the
    /// retrieved chunks. Before any index exists, returns the fixed
    /// not-ready reply without calling the chat service. Zero retrieved
    /// chunks still generate, with a no-context note in the prompt.
    pub async fn answer(&mut self, question: &str) -> AppResult<Answer> {
        match self.prepare(question).await? {
            Prepared::NotReady => Ok(Answer {
                text: NOT_READY_MESSAGE.to_string(),
                sources: Vec::new(),
            }),
            Prepared::Ready { request, sources } => {
                let response = self.chat.complete(&request).await?;
                self.memory.append(question, &response.content);

                Ok(Answer {
                    text: response.content,
                    sources,
                })
            }
        }
    }

    /// Like [`DocAssistant::answer`], but streams the generated text through
    /// `on_delta` as it arrives.
    pub async fn answer_streamed(
        &mut self,
        question: &str,
        mut on_delta: impl FnMut(&str),
    ) -> AppResult<Answer> {
        match self.prepare(question).await? {
            Prepared::NotReady => {
                on_delta(NOT_READY_MESSAGE);
                Ok(Answer {
                    text: NOT_READY_MESSAGE.to_string(),
                    sources: Vec::new(),
                })
            }
            Prepared::Ready { request, sources } => {
                let request = request.with_streaming();
                let mut stream = self.chat.stream(&request).await?;

                let mut text = String::new();
                while let Some(result) = stream.next().await {
                    let chunk = result?;
                    if !chunk.content.is_empty() {
                        on_delta(&chunk.content);
                        text.push_str(&chunk.content);
                    }
                    if chunk.done {
                        break;
                    }
                }

                self.memory.append(question, &text);
                Ok(Answer { text, sources })
            }
        }
    }

    /// Forget the conversation so far.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
        tracing::info!("Conversation memory cleared");
    }

    /// Read access to the conversation memory.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Retrieve chunks and assemble the chat request for a question.
    async fn prepare(&self, question: &str) -> AppResult<Prepared> {
        let Some(index) = self.index.as_ref() else {
            tracing::info!("Question received before any index was built");
            return Ok(Prepared::NotReady);
        };

        let retriever = Retriever::new(index, self.embeddings.as_ref());
        let retrieved = retriever
            .retrieve(question, self.options.retrieval_k)
            .await?;

        if retrieved.is_empty() {
            tracing::info!("No chunks retrieved; generating from history only");
        }

        let context: Vec<String> = retrieved.iter().map(|c| c.text.clone()).collect();
        let sources = distinct_sources(&retrieved);
        let history: Vec<(String, String)> = self
            .memory
            .history()
            .map(|turn| (turn.question.clone(), turn.answer.clone()))
            .collect();

        let prompt = build_rag_prompt(
            self.options.prompt_template.as_deref(),
            question,
            &context,
            &history,
        )?;

        let request = ChatRequest::new(prompt.user, &self.options.chat_model)
            .with_system(prompt.system)
            .with_temperature(self.options.temperature);

        Ok(Prepared::Ready { request, sources })
    }
}

/// Distinct source ids in first-seen order.
fn distinct_sources(retrieved: &[RetrievedChunk]) -> Vec<String> {
    let mut sources = Vec::new();
    for chunk in retrieved {
        if !sources.contains(&chunk.source_id) {
            sources.push(chunk.source_id.clone());
        }
    }
    sources
}
