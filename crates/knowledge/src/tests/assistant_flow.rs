//! Full-pipeline tests: JSON knowledge base in, answers out, with stubbed
//! embedding and chat services.

use crate::assistant::{DocAssistant, NOT_READY_MESSAGE};
use crate::embeddings::{EmbeddingProvider, MockProvider};
use crate::types::AssistantOptions;
use docqa_core::{AppError, AppResult};
use docqa_llm::{ChatClient, ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, ChatUsage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Chat stub that counts invocations and records the last prompt.
struct StubChat {
    reply: String,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubChat {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    fn record(&self, request: &ChatRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());
    }
}

#[async_trait::async_trait]
impl ChatClient for StubChat {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.record(request);
        Ok(ChatResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: ChatUsage::new(0, 0),
            done: true,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> AppResult<ChatStream> {
        self.record(request);

        let halfway = self.reply.len() / 2;
        let chunks: Vec<AppResult<ChatStreamChunk>> = vec![
            Ok(ChatStreamChunk {
                content: self.reply[..halfway].to_string(),
                model: request.model.clone(),
                done: false,
                usage: None,
            }),
            Ok(ChatStreamChunk {
                content: self.reply[halfway..].to_string(),
                model: request.model.clone(),
                done: true,
                usage: Some(ChatUsage::new(0, 0)),
            }),
        ];

        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Embedding provider whose failures can be toggled mid-test.
#[derive(Debug)]
struct SwitchableEmbeddings {
    inner: MockProvider,
    fail: AtomicBool,
}

impl SwitchableEmbeddings {
    fn new(dimensions: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MockProvider::new(dimensions),
            fail: AtomicBool::new(false),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for SwitchableEmbeddings {
    fn provider_name(&self) -> &str {
        "switchable"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Service("embedding backend unavailable".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

fn write_kb(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("kb.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn test_options() -> AssistantOptions {
    AssistantOptions {
        chunk_size: 200,
        chunk_overlap: 20,
        retrieval_k: 1,
        ..AssistantOptions::default()
    }
}

fn assistant_with(
    options: AssistantOptions,
    chat: Arc<StubChat>,
) -> (DocAssistant, Arc<SwitchableEmbeddings>) {
    let embeddings = SwitchableEmbeddings::new(256);
    let assistant = DocAssistant::new(options, embeddings.clone(), chat).unwrap();
    (assistant, embeddings)
}

#[tokio::test]
async fn small_knowledge_base_end_to_end() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(
        &temp,
        r#"[{"name":"Alpha","desc":"first"},{"name":"Beta","desc":"second"}]"#,
    );

    let chat = StubChat::new("Alpha is the first record.");
    let (mut assistant, _) = assistant_with(test_options(), chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assert_eq!(documents.len(), 2);

    let stats = assistant.build_index(&documents).await.unwrap();
    assert_eq!(stats.documents, 2);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.entries, 2);
    assert!(assistant.is_ready());

    let answer = assistant.answer("What is Alpha?").await.unwrap();
    assert_eq!(answer.text, "Alpha is the first record.");
    assert_eq!(answer.sources, vec!["document_0"]);
    assert_eq!(chat.calls(), 1);

    // The retrieved Alpha chunk made it into the prompt
    let prompt = chat.last_prompt().unwrap();
    assert!(prompt.contains("name: Alpha | desc: first"));
    assert!(prompt.contains("Question: What is Alpha?"));
}

#[tokio::test]
async fn empty_knowledge_base_fails_to_build() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, "[]");

    let chat = StubChat::new("unused");
    let (mut assistant, _) = assistant_with(test_options(), chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assert!(documents.is_empty());

    match assistant.build_index(&documents).await {
        Err(AppError::Ingestion(_)) => {}
        other => panic!("Expected ingestion error, got {:?}", other),
    }

    // No silently empty, queryable index
    assert!(!assistant.is_ready());
    let answer = assistant.answer("anything?").await.unwrap();
    assert_eq!(answer.text, NOT_READY_MESSAGE);
    assert!(answer.sources.is_empty());
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn question_before_build_skips_chat_service() {
    let chat = StubChat::new("unused");
    let (mut assistant, _) = assistant_with(test_options(), chat.clone());

    let answer = assistant.answer("Is anyone there?").await.unwrap();
    assert_eq!(answer.text, NOT_READY_MESSAGE);
    assert!(answer.sources.is_empty());
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn memory_window_evicts_oldest_turns() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"},{"name":"Beta"}]"#);

    let chat = StubChat::new("answer");
    let options = AssistantOptions {
        memory_window: 2,
        ..test_options()
    };
    let (mut assistant, _) = assistant_with(options, chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();

    assistant.answer("q1").await.unwrap();
    assistant.answer("q2").await.unwrap();

    let questions: Vec<_> = assistant
        .memory()
        .history()
        .map(|t| t.question.clone())
        .collect();
    assert_eq!(questions, vec!["q1", "q2"]);

    assistant.answer("q3").await.unwrap();
    assistant.answer("q4").await.unwrap();

    let questions: Vec<_> = assistant
        .memory()
        .history()
        .map(|t| t.question.clone())
        .collect();
    assert_eq!(questions, vec!["q3", "q4"]);
}

#[tokio::test]
async fn history_flows_into_prompt() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"}]"#);

    let chat = StubChat::new("the answer");
    let (mut assistant, _) = assistant_with(test_options(), chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();

    assistant.answer("first question").await.unwrap();
    assistant.answer("second question").await.unwrap();

    let prompt = chat.last_prompt().unwrap();
    assert!(prompt.contains("User: first question"));
    assert!(prompt.contains("Assistant: the answer"));
}

#[tokio::test]
async fn clear_memory_resets_history() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"}]"#);

    let chat = StubChat::new("answer");
    let (mut assistant, _) = assistant_with(test_options(), chat);

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();

    assistant.answer("q1").await.unwrap();
    assert_eq!(assistant.memory().len(), 1);

    assistant.clear_memory();
    assert!(assistant.memory().is_empty());
}

#[tokio::test]
async fn failed_rebuild_keeps_previous_index() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"},{"name":"Beta"}]"#);

    let chat = StubChat::new("answer");
    let (mut assistant, embeddings) = assistant_with(test_options(), chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();
    assert!(assistant.is_ready());

    // A rebuild that dies in the embedding stage must not disturb the
    // index already in place.
    embeddings.set_failing(true);
    match assistant.build_index(&documents).await {
        Err(AppError::Service(_)) => {}
        other => panic!("Expected service error, got {:?}", other),
    }
    assert!(assistant.is_ready());

    embeddings.set_failing(false);
    let answer = assistant.answer("What is Alpha?").await.unwrap();
    assert_eq!(answer.sources, vec!["document_0"]);
}

#[tokio::test]
async fn service_failure_leaves_memory_untouched() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"}]"#);

    let chat = StubChat::new("answer");
    let (mut assistant, embeddings) = assistant_with(test_options(), chat);

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();
    assistant.answer("q1").await.unwrap();

    embeddings.set_failing(true);
    assert!(assistant.answer("q2").await.is_err());

    // The failed turn was not recorded
    assert_eq!(assistant.memory().len(), 1);
}

#[tokio::test]
async fn index_round_trips_across_sessions() {
    let temp = TempDir::new().unwrap();
    let kb_path = write_kb(
        &temp,
        r#"[{"name":"Alpha","desc":"first"},{"name":"Beta","desc":"second"}]"#,
    );
    let index_path = temp.path().join("index.sqlite");

    let chat = StubChat::new("answer");
    let (mut builder, _) = assistant_with(test_options(), chat.clone());

    let documents = builder.load_documents(&kb_path).unwrap();
    builder.build_index(&documents).await.unwrap();
    builder.save_index(&index_path).unwrap();

    // A fresh session loads the saved index and retrieves identically
    let (mut reader, _) = assistant_with(test_options(), chat);
    assert!(!reader.is_ready());
    reader.load_index(&index_path).unwrap();
    assert!(reader.is_ready());

    let answer = reader.answer("What is Alpha?").await.unwrap();
    assert_eq!(answer.sources, vec!["document_0"]);
}

#[tokio::test]
async fn save_without_index_is_not_ready() {
    let chat = StubChat::new("answer");
    let (assistant, _) = assistant_with(test_options(), chat);

    let temp = TempDir::new().unwrap();
    match assistant.save_index(&temp.path().join("index.sqlite")) {
        Err(AppError::NotReady(_)) => {}
        other => panic!("Expected not-ready error, got {:?}", other),
    }
}

#[tokio::test]
async fn streamed_answer_collects_deltas() {
    let temp = TempDir::new().unwrap();
    let path = write_kb(&temp, r#"[{"name":"Alpha"}]"#);

    let chat = StubChat::new("streamed reply text");
    let (mut assistant, _) = assistant_with(test_options(), chat.clone());

    let documents = assistant.load_documents(&path).unwrap();
    assistant.build_index(&documents).await.unwrap();

    let mut deltas = Vec::new();
    let answer = assistant
        .answer_streamed("What is Alpha?", |delta| deltas.push(delta.to_string()))
        .await
        .unwrap();

    assert_eq!(answer.text, "streamed reply text");
    assert_eq!(deltas.concat(), "streamed reply text");
    assert!(deltas.len() > 1);
    assert_eq!(chat.calls(), 1);

    // Streamed turns land in memory like completed ones
    assert_eq!(assistant.memory().len(), 1);
}

#[tokio::test]
async fn invalid_options_rejected_at_construction() {
    let chat = StubChat::new("answer");
    let embeddings = SwitchableEmbeddings::new(64);

    let options = AssistantOptions {
        chunk_size: 100,
        chunk_overlap: 100,
        ..AssistantOptions::default()
    };

    match DocAssistant::new(options, embeddings, chat) {
        Err(AppError::Config(_)) => {}
        Ok(_) => panic!("Expected config error"),
        Err(other) => panic!("Expected config error, got {}", other),
    }
}
