//! Embedding providers for knowledge chunks.
//!
//! Defines the provider trait and a factory for the supported backends.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiEmbedding;
pub use mock::MockProvider;

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider identifier ("gemini", "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimension
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "models/embedding-001".to_string(),
            dimensions: 768,
        }
    }
}

/// Trait for embedding providers.
///
/// Callers must treat embedding as a possibly-slow, possibly-failing
/// external operation; failures surface as `AppError::Service`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Service("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(
                    "Gemini embeddings require an API key. Set GOOGLE_API_KEY or DOCQA_API_KEY."
                        .to_string(),
                )
            })?;

            let provider = GeminiEmbedding::new(api_key, &config.model, config.dimensions)?;
            Ok(Arc::new(provider))
        }

        "mock" => {
            let provider = MockProvider::new(config.dimensions);
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, mock",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        };

        let provider = create_provider(&config, None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_gemini_provider_requires_key() {
        let config = EmbeddingConfig::default();

        match create_provider(&config, None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("API key")),
            other => panic!("Expected config error, got {:?}", other.map(|_| ())),
        }

        let provider = create_provider(&config, Some("test-key")).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model_name(), "models/embedding-001");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            model: "test".to_string(),
            dimensions: 384,
        };

        let result = create_provider(&config, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        };
        let provider = create_provider(&config, None).unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
