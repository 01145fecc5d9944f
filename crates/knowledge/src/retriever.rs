//! Similarity retrieval over the vector index.

use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::types::RetrievedChunk;
use docqa_core::AppResult;

/// Wraps a built index and an embedding provider with a top-k text query.
///
/// Deterministic given a deterministic provider and index.
pub struct Retriever<'a> {
    index: &'a VectorIndex,
    embeddings: &'a dyn EmbeddingProvider,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a VectorIndex, embeddings: &'a dyn EmbeddingProvider) -> Self {
        Self { index, embeddings }
    }

    /// Embed the question and return the k most similar chunks.
    pub async fn retrieve(&self, question: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        let embedding = self.embeddings.embed(question).await?;
        let results = self.index.query(&embedding, k)?;

        tracing::debug!(
            "Retrieved {} chunks for question ({} chars)",
            results.len(),
            question.len()
        );

        Ok(results
            .into_iter()
            .map(|(entry, score)| RetrievedChunk {
                text: entry.text.clone(),
                source_id: entry.source_id.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::types::VectorEntry;

    async fn build_index(provider: &MockProvider, texts: &[(&str, &str)]) -> VectorIndex {
        let inputs: Vec<String> = texts.iter().map(|(text, _)| text.to_string()).collect();
        let vectors = provider.embed_batch(&inputs).await.unwrap();

        let entries: Vec<VectorEntry> = vectors
            .into_iter()
            .zip(texts)
            .map(|(vector, (text, source_id))| VectorEntry {
                vector,
                text: text.to_string(),
                source_id: source_id.to_string(),
            })
            .collect();

        VectorIndex::build(entries).unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_top_match() {
        let provider = MockProvider::new(256);
        let index = build_index(
            &provider,
            &[
                ("name: Alpha | desc: first", "document_0"),
                ("name: Beta | desc: second", "document_1"),
            ],
        )
        .await;

        let retriever = Retriever::new(&index, &provider);
        let results = retriever.retrieve("What is Alpha?", 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_id, "document_0");
        assert!(results[0].text.contains("Alpha"));
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let provider = MockProvider::new(256);
        let index = build_index(
            &provider,
            &[
                ("rust is a systems language", "document_0"),
                ("pasta is an italian dish", "document_1"),
            ],
        )
        .await;

        let retriever = Retriever::new(&index, &provider);
        let first = retriever.retrieve("tell me about rust", 2).await.unwrap();
        let second = retriever.retrieve("tell me about rust", 2).await.unwrap();

        let ids = |results: &[RetrievedChunk]| {
            results.iter().map(|r| r.source_id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
