//! Mock embedding provider using trigram-based content-aware embeddings.

use crate::embeddings::EmbeddingProvider;
use docqa_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Mock provider for tests and offline development.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like a hosted model, but
/// consistent and content-dependent, which is what the tests need.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

impl MockProvider {
    /// Create a new mock provider with the given dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower.split_whitespace() {
            if word.len() > 2 && !stop_words.contains(word) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in &word_freq {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim_idx = (hash_str(&trigram, 37) as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Also encode the whole word
            let base_dim = (hash_str(word, 31) as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        normalize(&mut embedding);
        embedding
    }
}

/// Simple polynomial byte hash.
fn hash_str(text: &str, base: u64) -> u64 {
    text.bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(base).wrapping_add(b as u64))
}

/// Scale a vector to unit length (zero vectors stay zero).
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
