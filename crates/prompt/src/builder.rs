//! Prompt builder for the retrieval-augmented answering flow.
//!
//! Assembles the fixed system instruction, retrieved context, conversation
//! history, and the current question into a single prompt via Handlebars.

use crate::types::BuiltPrompt;
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Fixed system instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful document assistant, designed to provide \
accurate and personalized responses based on the provided context.\n\n\
Use the context to answer the user's question. If the context does not contain relevant \
information, politely say so and provide general guidance when appropriate.\n\n\
Always maintain a friendly, professional tone and structure your responses clearly. When \
possible, reference specific information from the context to support your answers.";

/// Default Handlebars template for the user message.
pub const DEFAULT_USER_TEMPLATE: &str = "\
{{#if context}}Context:
{{context}}{{else}}Note: no relevant context was found in the knowledge base for this question. \
Let the user know the documents do not cover it and answer from general knowledge where \
appropriate.{{/if}}

{{#if history}}Conversation so far:
{{history}}

{{/if}}Question: {{question}}";

/// Build the RAG prompt for a question.
///
/// # Arguments
/// * `template` - Optional user-message template override (Handlebars)
/// * `question` - The current question
/// * `context_blocks` - Retrieved chunk texts, most relevant first
/// * `history` - Past (question, answer) turns, chronological
pub fn build_rag_prompt(
    template: Option<&str>,
    question: &str,
    context_blocks: &[String],
    history: &[(String, String)],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building RAG prompt: {} context blocks, {} history turns",
        context_blocks.len(),
        history.len()
    );

    let variables = serde_json::json!({
        "question": question,
        "context": format_context(context_blocks),
        "history": format_history(history),
    });

    let user = render_template(template.unwrap_or(DEFAULT_USER_TEMPLATE), &variables)?;

    Ok(BuiltPrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
        context_blocks: context_blocks.len(),
        history_turns: history.len(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Format retrieved chunks into numbered context blocks.
fn format_context(blocks: &[String]) -> String {
    blocks
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[Document {}]\n{}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Format conversation turns into a plain transcript.
fn format_history(turns: &[(String, String)]) -> String {
    turns
        .iter()
        .map(|(question, answer)| format!("User: {}\nAssistant: {}", question, answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_context() {
        let blocks = vec!["Alpha is first".to_string(), "Beta is second".to_string()];
        let prompt = build_rag_prompt(None, "What is Alpha?", &blocks, &[]).unwrap();

        assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
        assert!(prompt.user.contains("[Document 1]"));
        assert!(prompt.user.contains("[Document 2]"));
        assert!(prompt.user.contains("Alpha is first"));
        assert!(prompt.user.contains("Question: What is Alpha?"));
        assert!(!prompt.user.contains("no relevant context"));
        assert_eq!(prompt.context_blocks, 2);
    }

    #[test]
    fn test_build_without_context() {
        let prompt = build_rag_prompt(None, "What is Alpha?", &[], &[]).unwrap();

        assert!(prompt.user.contains("no relevant context was found"));
        assert!(prompt.user.contains("Question: What is Alpha?"));
        assert_eq!(prompt.context_blocks, 0);
    }

    #[test]
    fn test_build_with_history() {
        let history = vec![(
            "What is Alpha?".to_string(),
            "Alpha is the first record.".to_string(),
        )];
        let prompt = build_rag_prompt(None, "And Beta?", &[], &history).unwrap();

        assert!(prompt.user.contains("Conversation so far:"));
        assert!(prompt.user.contains("User: What is Alpha?"));
        assert!(prompt.user.contains("Assistant: Alpha is the first record."));
        assert_eq!(prompt.history_turns, 1);
    }

    #[test]
    fn test_build_without_history_omits_transcript() {
        let prompt = build_rag_prompt(None, "Hello", &[], &[]).unwrap();
        assert!(!prompt.user.contains("Conversation so far:"));
    }

    #[test]
    fn test_custom_template() {
        let template = "Q={{question}}";
        let prompt = build_rag_prompt(Some(template), "hi", &[], &[]).unwrap();
        assert_eq!(prompt.user, "Q=hi");
    }

    #[test]
    fn test_no_html_escaping() {
        let blocks = vec!["a < b && c > d".to_string()];
        let prompt = build_rag_prompt(None, "compare", &blocks, &[]).unwrap();
        assert!(prompt.user.contains("a < b && c > d"));
    }
}
