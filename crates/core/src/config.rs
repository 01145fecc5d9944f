//! Configuration management for the docqa assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.docqa/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with persisted state stored in `.docqa/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds every recognized tuning knob of the question-answering pipeline
/// along with presentation-level options used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Embedding/chat provider (e.g., "gemini", "mock")
    pub provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Chat model identifier
    pub chat_model: String,

    /// Embedding vector dimension
    pub embedding_dimensions: usize,

    /// Sampling temperature for answer generation (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    pub retrieval_k: usize,

    /// Conversation memory window (turns)
    pub memory_window: usize,

    /// API key for the hosted provider
    pub api_key: Option<String>,

    /// Saved index location override
    pub index_path: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    models: Option<ModelsConfig>,
    sampling: Option<SamplingConfig>,
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    memory: Option<MemoryConfig>,
    index: Option<IndexConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelsConfig {
    embedding: Option<String>,
    chat: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SamplingConfig {
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChunkingConfig {
    size: Option<usize>,
    overlap: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalConfig {
    k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryConfig {
    window: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            embedding_model: "models/embedding-001".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            embedding_dimensions: 768,
            temperature: 0.7,
            chunk_size: 1000,
            chunk_overlap: 100,
            retrieval_k: 4,
            memory_window: 5,
            api_key: None,
            index_path: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables.
    ///
    /// Precedence (lowest to highest): defaults, `.docqa/config.yaml`,
    /// environment variables. CLI flags are applied later via
    /// [`AppConfig::with_overrides`].
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_PROVIDER`: Provider identifier
    /// - `DOCQA_EMBEDDING_MODEL` / `DOCQA_CHAT_MODEL`: Model identifiers
    /// - `DOCQA_TEMPERATURE`, `DOCQA_CHUNK_SIZE`, `DOCQA_CHUNK_OVERLAP`,
    ///   `DOCQA_RETRIEVAL_K`, `DOCQA_MEMORY_WINDOW`: Pipeline knobs
    /// - `DOCQA_API_KEY` (falling back to `GOOGLE_API_KEY`): API credential
    /// - `DOCQA_INDEX`: Saved index path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".docqa/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(model) = std::env::var("DOCQA_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Some(dimensions) = env_parse::<usize>("DOCQA_EMBEDDING_DIMENSIONS")? {
            config.embedding_dimensions = dimensions;
        }
        if let Some(temperature) = env_parse::<f32>("DOCQA_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(size) = env_parse::<usize>("DOCQA_CHUNK_SIZE")? {
            config.chunk_size = size;
        }
        if let Some(overlap) = env_parse::<usize>("DOCQA_CHUNK_OVERLAP")? {
            config.chunk_overlap = overlap;
        }
        if let Some(k) = env_parse::<usize>("DOCQA_RETRIEVAL_K")? {
            config.retrieval_k = k;
        }
        if let Some(window) = env_parse::<usize>("DOCQA_MEMORY_WINDOW")? {
            config.memory_window = window;
        }
        if let Ok(path) = std::env::var("DOCQA_INDEX") {
            config.index_path = Some(PathBuf::from(path));
        }

        config.api_key = std::env::var("DOCQA_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        tracing::debug!(
            "Configuration loaded (provider: {}, chat model: {})",
            config.provider,
            config.chat_model
        );

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }

        if let Some(models) = config_file.models {
            if let Some(embedding) = models.embedding {
                result.embedding_model = embedding;
            }
            if let Some(chat) = models.chat {
                result.chat_model = chat;
            }
            if let Some(dimensions) = models.dimensions {
                result.embedding_dimensions = dimensions;
            }
        }

        if let Some(sampling) = config_file.sampling {
            if let Some(temperature) = sampling.temperature {
                result.temperature = temperature;
            }
        }

        if let Some(chunking) = config_file.chunking {
            if let Some(size) = chunking.size {
                result.chunk_size = size;
            }
            if let Some(overlap) = chunking.overlap {
                result.chunk_overlap = overlap;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(k) = retrieval.k {
                result.retrieval_k = k;
            }
        }

        if let Some(memory) = config_file.memory {
            if let Some(window) = memory.window {
                result.memory_window = window;
            }
        }

        if let Some(index) = config_file.index {
            if let Some(path) = index.path {
                result.index_path = Some(PathBuf::from(path));
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        chat_model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(chat_model) = chat_model {
            self.chat_model = chat_model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_docqa_dir(&self) -> AppResult<()> {
        let docqa_dir = self.docqa_dir();
        if !docqa_dir.exists() {
            std::fs::create_dir_all(&docqa_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the saved index location.
    pub fn index_path(&self) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| self.docqa_dir().join("index.sqlite"))
    }

    /// Resolve the API credential, if any.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    /// Validate the configured option values.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "mock"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "embedding_dimensions must be positive".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.retrieval_k == 0 {
            return Err(AppError::Config("retrieval_k must be positive".to_string()));
        }

        if self.memory_window == 0 {
            return Err(AppError::Config(
                "memory_window must be positive".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within 0.0-2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Parse an environment variable into a value, erroring on bad input.
fn env_parse<T: FromStr>(name: &str) -> AppResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
