//! Google Gemini chat provider implementation.
//!
//! Talks to the Generative Language API (`generateContent` and
//! `streamGenerateContent`). API reference:
//! https://ai.google.dev/api/generate-content

use crate::client::{ChatClient, ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, ChatUsage};
use docqa_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Request body for the generateContent API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// One conversation content entry.
#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

/// System instruction wrapper.
#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

/// A text part.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Generation configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Response from the generateContent API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini chat client.
pub struct GeminiClient {
    /// Base URL for the Generative Language API
    base_url: String,

    /// API credential
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new Gemini client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Service(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Convert a ChatRequest to the Gemini wire format.
    fn to_gemini_request(&self, request: &ChatRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|text| SystemInstruction {
                parts: vec![Part { text: text.clone() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
        }
    }

    /// Collect the candidate text out of a response payload.
    fn candidate_text(response: &GenerateContentResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn convert_usage(metadata: &UsageMetadata) -> ChatUsage {
        ChatUsage::new(metadata.prompt_token_count, metadata.candidates_token_count)
    }
}

#[async_trait::async_trait]
impl ChatClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!("Sending completion request to Gemini");
        tracing::debug!("Model: {}, prompt length: {}", request.model, request.prompt.len());

        let body = self.to_gemini_request(request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Service(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Service(format!("Failed to parse Gemini response: {}", e)))?;

        let content = Self::candidate_text(&parsed);
        let usage = parsed
            .usage_metadata
            .as_ref()
            .map(Self::convert_usage)
            .unwrap_or_default();

        tracing::info!("Received completion from Gemini ({} chars)", content.len());

        Ok(ChatResponse {
            content,
            model: request.model.clone(),
            usage,
            done: true,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> AppResult<ChatStream> {
        tracing::info!("Starting streaming request to Gemini");

        let body = self.to_gemini_request(request);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, request.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("Failed to send streaming request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Service(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let model = request.model.clone();
        let mut bytes = response.bytes_stream();

        // The SSE body is a sequence of "data: <json>" lines. Buffer bytes
        // until a full line is available, then parse each payload.
        let stream = async_stream::try_stream! {
            let mut buf = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::Service(format!("Stream error: {}", e)))?;
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find('\n') {
                    let line = buf[..pos].trim_end_matches('\r').to_string();
                    buf.drain(..=pos);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };

                    let parsed: GenerateContentResponse = serde_json::from_str(payload)
                        .map_err(|e| {
                            AppError::Service(format!("Failed to parse stream chunk: {}", e))
                        })?;

                    let done = parsed
                        .candidates
                        .first()
                        .and_then(|c| c.finish_reason.as_ref())
                        .is_some();

                    yield ChatStreamChunk {
                        content: GeminiClient::candidate_text(&parsed),
                        model: model.clone(),
                        done,
                        usage: parsed.usage_metadata.as_ref().map(GeminiClient::convert_usage),
                    };
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
