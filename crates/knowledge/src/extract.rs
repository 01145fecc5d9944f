//! Content extraction from JSON knowledge bases.
//!
//! Flattens arbitrarily nested JSON records into plain text suitable for
//! chunking and embedding. Object iteration follows insertion order
//! (serde_json `preserve_order`), so extraction is reproducible for
//! identical input.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use serde_json::Value;
use std::path::Path;

/// Load a JSON knowledge base file into documents.
///
/// The file must contain either an array of items (identifiers
/// `document_<index>`) or an object mapping keys to items (identifiers are
/// the keys). Items whose extraction yields no text are dropped.
pub fn load_knowledge_base(path: &Path) -> AppResult<Vec<Document>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Ingestion(format!("Failed to read knowledge base {:?}: {}", path, e))
    })?;

    let data: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::Ingestion(format!("Malformed JSON in {:?}: {}", path, e)))?;

    let mut documents = Vec::new();

    match &data {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let content = extract_content(item);
                if !content.is_empty() {
                    documents.push(Document {
                        content,
                        source_id: format!("document_{}", i),
                    });
                }
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                let content = extract_content(value);
                if !content.is_empty() {
                    documents.push(Document {
                        content,
                        source_id: key.clone(),
                    });
                }
            }
        }
        _ => {
            return Err(AppError::Ingestion(format!(
                "Knowledge base {:?} must be a JSON array or object",
                path
            )));
        }
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), path);
    Ok(documents)
}

/// Extract a flat text summary from a JSON value.
///
/// Objects render scalar members as `key: value` pairs, arrays as
/// comma-joined lists, and nested objects recursively; parts are joined
/// with `" | "`. Top-level scalars render as `Content: <value>` and
/// top-level arrays as `Items: ...`. Returns an empty string when the value
/// has no scalar leaves.
pub fn extract_content(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut parts = Vec::new();

            for (key, member) in map {
                match member {
                    Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                        parts.push(format!("{}: {}", key, render_scalar(member)));
                    }
                    Value::Array(items) => {
                        let joined = join_array(items);
                        if !joined.is_empty() {
                            parts.push(format!("{}: {}", key, joined));
                        }
                    }
                    Value::Object(_) => {
                        let nested = extract_content(member);
                        if !nested.is_empty() {
                            parts.push(format!("{}: {}", key, nested));
                        }
                    }
                    Value::Null => {}
                }
            }

            parts.join(" | ")
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            format!("Content: {}", render_scalar(value))
        }
        Value::Array(items) => {
            let joined = join_array(items);
            if joined.is_empty() {
                String::new()
            } else {
                format!("Items: {}", joined)
            }
        }
        Value::Null => String::new(),
    }
}

/// Render a scalar value as plain text.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Join array elements with ", ", recursing into non-scalar elements.
fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(render_element)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_element(value: &Value) -> String {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => render_scalar(value),
        Value::Array(items) => join_array(items),
        Value::Object(_) => extract_content(value),
        Value::Null => String::new(),
    }
}
