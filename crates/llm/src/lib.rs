//! docqa LLM integration.
//!
//! Chat-completion client abstractions and the Gemini provider.

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{ChatClient, ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, ChatUsage};
pub use factory::create_client;
