//! Prompt template loading.
//!
//! The default template is compiled in; a workspace may override the user
//! message template by placing a Handlebars file at `.docqa/prompt.hbs`.

use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Get the path to the workspace template override.
pub fn template_path(workspace: &Path) -> PathBuf {
    workspace.join(".docqa").join("prompt.hbs")
}

/// Load the workspace template override, if present.
///
/// Returns `None` when no override file exists; the caller falls back to
/// [`crate::builder::DEFAULT_USER_TEMPLATE`].
pub fn load_template(workspace: &Path) -> AppResult<Option<String>> {
    let path = template_path(workspace);

    if !path.exists() {
        return Ok(None);
    }

    let template = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Prompt(format!("Failed to read template {:?}: {}", path, e)))?;

    tracing::debug!("Loaded prompt template override from {:?}", path);
    Ok(Some(template))
}
