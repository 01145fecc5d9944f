//! Gemini embedding provider.
//!
//! Maps chunk text to fixed-dimension vectors via the Generative Language
//! API `embedContent` endpoint. There is no local fallback: failures
//! (timeout, auth, rate limit) propagate to the caller as `Service` errors.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Request payload for the embedContent API
#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    /// Model name (e.g., "models/embedding-001")
    model: String,
    /// Text to embed
    content: EmbedContent,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

/// Response from the embedContent API
#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding provider.
pub struct GeminiEmbedding {
    /// HTTP client for API requests
    client: Client,
    /// API base URL
    base_url: String,
    /// API credential
    api_key: String,
    /// Model name (e.g., "models/embedding-001")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

impl GeminiEmbedding {
    /// Create a new Gemini embedding provider.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Service(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        })
    }

    /// Embed a single text (no retries).
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/{}:embedContent?key={}", self.base_url, self.model, self.api_key);

        let request = EmbedContentRequest {
            model: self.model.clone(),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
        };

        debug!("Sending embedding request ({} chars)", text.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("Failed to send request to Gemini: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Service(format!(
                "Gemini embedding API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Service(format!("Failed to parse embedding response: {}", e)))?;

        if body.embedding.values.len() != self.dimensions {
            return Err(AppError::Service(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                body.embedding.values.len(),
                self.dimensions
            )));
        }

        Ok(body.embedding.values)
    }
}

impl std::fmt::Debug for GeminiEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedding")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Embedding batch of {} texts", texts.len());

        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!("Skipping empty text at index {}", i);
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }

            let embedding = self.embed_single(text).await?;
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }
}
