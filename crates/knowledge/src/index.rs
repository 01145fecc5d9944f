//! In-memory vector index with SQLite persistence.
//!
//! The index owns the full entry set and answers top-k cosine-similarity
//! queries by scanning it. `save`/`load` persist the entries to a SQLite
//! file tagged with a format marker and an integrity checksum, so loading
//! from a foreign or corrupted file is rejected.

use crate::types::VectorEntry;
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

const FORMAT_MARKER: &str = "docqa-index";
const FORMAT_VERSION: &str = "1";

/// A built, queryable vector index.
///
/// Construction via [`VectorIndex::build`] or [`VectorIndex::load`] is the
/// only way to obtain one, so an existing value is always queryable; the
/// unbuilt state lives in the orchestrator as `Option<VectorIndex>`.
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
    dimensions: usize,
}

/// Statistics about a saved index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub entries: usize,
    pub dimensions: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub file_size_bytes: u64,
}

impl VectorIndex {
    /// Construct an index from a set of entries, replacing nothing yet:
    /// the caller decides when to swap it in.
    ///
    /// An empty entry set is rejected so that a silently empty, queryable
    /// index can never exist.
    pub fn build(entries: Vec<VectorEntry>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(AppError::Ingestion(
                "cannot build an index from an empty entry set".to_string(),
            ));
        }

        let dimensions = entries[0].vector.len();
        if dimensions == 0 {
            return Err(AppError::Index(
                "entries carry zero-dimension vectors".to_string(),
            ));
        }

        for (i, entry) in entries.iter().enumerate() {
            if entry.vector.len() != dimensions {
                return Err(AppError::Index(format!(
                    "entry {} has dimension {}, expected {}",
                    i,
                    entry.vector.len(),
                    dimensions
                )));
            }
        }

        tracing::debug!("Built vector index with {} entries", entries.len());

        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension of the indexed vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return the top-k entries by cosine similarity, descending.
    ///
    /// Ties keep insertion order (the sort is stable).
    pub fn query(&self, vector: &[f32], k: usize) -> AppResult<Vec<(&VectorEntry, f32)>> {
        if vector.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "query vector has dimension {}, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(&VectorEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, cosine_similarity(vector, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        tracing::debug!("Retrieved {} entries (requested top-{})", scored.len(), k);

        Ok(scored)
    }

    /// Persist the index to a SQLite file, replacing any prior file.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Index(format!("Failed to create index directory: {}", e))
                })?;
            }
        }

        if path.exists() {
            std::fs::remove_file(path)
                .map_err(|e| AppError::Index(format!("Failed to replace index file: {}", e)))?;
        }

        let mut conn = Connection::open(path)
            .map_err(|e| AppError::Index(format!("Failed to open index at {:?}: {}", path, e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE entries (
                id INTEGER PRIMARY KEY,
                source_id TEXT NOT NULL,
                text TEXT NOT NULL,
                vector BLOB NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to start transaction: {}", e)))?;

        let meta = [
            ("format", FORMAT_MARKER.to_string()),
            ("version", FORMAT_VERSION.to_string()),
            ("dimensions", self.dimensions.to_string()),
            ("checksum", self.checksum()),
            ("created_at", Utc::now().to_rfc3339()),
        ];
        for (key, value) in &meta {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| AppError::Index(format!("Failed to write metadata: {}", e)))?;
        }

        for (i, entry) in self.entries.iter().enumerate() {
            tx.execute(
                "INSERT INTO entries (id, source_id, text, vector) VALUES (?1, ?2, ?3, ?4)",
                params![
                    i as i64,
                    entry.source_id,
                    entry.text,
                    vector_to_bytes(&entry.vector),
                ],
            )
            .map_err(|e| AppError::Index(format!("Failed to write entry: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit index: {}", e)))?;

        tracing::info!("Saved index with {} entries to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// Load a previously-saved index.
    ///
    /// Rejects missing files, files without this system's format marker,
    /// and files whose entries no longer match the stored checksum.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Index(format!("No saved index at {:?}", path)));
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Index(format!("Failed to open index at {:?}: {}", path, e)))?;

        let marker: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'format'", [], |row| {
                row.get(0)
            })
            .map_err(|_| AppError::Index(format!("{:?} is not a docqa index", path)))?;

        if marker != FORMAT_MARKER {
            return Err(AppError::Index(format!("{:?} is not a docqa index", path)));
        }

        let stored_checksum: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'checksum'", [], |row| {
                row.get(0)
            })
            .map_err(|_| AppError::Index(format!("{:?} is missing its checksum", path)))?;

        let mut stmt = conn
            .prepare("SELECT source_id, text, vector FROM entries ORDER BY id")
            .map_err(|e| AppError::Index(format!("Failed to read entries: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let source_id: String = row.get(0)?;
                let text: String = row.get(1)?;
                let bytes: Vec<u8> = row.get(2)?;
                Ok((source_id, text, bytes))
            })
            .map_err(|e| AppError::Index(format!("Failed to read entries: {}", e)))?;

        let mut entries = Vec::new();
        for row in rows {
            let (source_id, text, bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read entry: {}", e)))?;
            entries.push(VectorEntry {
                vector: bytes_to_vector(&bytes)?,
                text,
                source_id,
            });
        }

        let index = Self::build(entries)
            .map_err(|e| AppError::Index(format!("Saved index at {:?} is invalid: {}", path, e)))?;

        if index.checksum() != stored_checksum {
            return Err(AppError::Index(format!(
                "Checksum mismatch in {:?}; the index file is corrupted",
                path
            )));
        }

        tracing::info!("Loaded index with {} entries from {:?}", index.len(), path);
        Ok(index)
    }

    /// Read statistics from a saved index file without keeping it in memory.
    pub fn stats(path: &Path) -> AppResult<IndexStats> {
        let index = Self::load(path)?;
        let file_size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let conn = Connection::open(path)
            .map_err(|e| AppError::Index(format!("Failed to open index at {:?}: {}", path, e)))?;
        let created_at: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'created_at'",
                [],
                |row| row.get(0),
            )
            .ok();

        Ok(IndexStats {
            entries: index.len(),
            dimensions: index.dimensions(),
            created_at: created_at
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            file_size_bytes,
        })
    }

    /// SHA-256 over the entry set, used to detect corrupted index files.
    fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.source_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.text.as_bytes());
            hasher.update([0u8]);
            hasher.update(vector_to_bytes(&entry.vector));
        }
        hex::encode(hasher.finalize())
    }
}

/// Convert an embedding vector to little-endian bytes for storage.
fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_vector(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index("Invalid vector bytes length".to_string()));
    }

    let mut vector = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        vector.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(vector)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
