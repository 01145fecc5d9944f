//! Chat client factory.
//!
//! This module provides a factory for creating chat clients based on
//! application configuration. It handles provider resolution and credential
//! checks.

use crate::client::ChatClient;
use crate::providers::GeminiClient;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API credential (required for hosted providers)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the required
/// credential is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn ChatClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(
                    "Gemini provider requires an API key. Set GOOGLE_API_KEY or DOCQA_API_KEY."
                        .to_string(),
                )
            })?;

            let client = match endpoint {
                Some(endpoint) => GeminiClient::with_base_url(api_key, endpoint)?,
                None => GeminiClient::new(api_key)?,
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown chat provider: {}. Supported: gemini",
            provider
        ))),
    }
}
