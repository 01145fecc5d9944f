//! Text chunking with configurable size and overlap.
//!
//! Splits document content into chunks of at most `chunk_size` characters,
//! with consecutive chunks sharing exactly `overlap` characters of context.
//! Cut points prefer paragraph breaks, then sentence ends, then word
//! boundaries, before falling back to a hard character cut. Stripping the
//! first `overlap` characters of every chunk after the first reconstructs
//! the original content exactly.

use crate::types::{Chunk, Document};
use docqa_core::{AppError, AppResult};
use unicode_segmentation::UnicodeSegmentation;

/// Split one document into overlapping chunks.
///
/// Content of at most `chunk_size` characters yields exactly one chunk.
/// Requires `overlap < chunk_size`.
pub fn chunk_document(
    document: &Document,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(AppError::Config("chunk size must be positive".to_string()));
    }
    if overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    let chars: Vec<char> = document.content.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Ok(vec![]);
    }

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0usize;

    loop {
        if total - start <= chunk_size {
            chunks.push(make_chunk(&chars[start..], document, position));
            break;
        }

        let window: String = chars[start..start + chunk_size].iter().collect();
        let cut = start + find_cut(&window, overlap, chunk_size);

        chunks.push(make_chunk(&chars[start..cut], document, position));
        position += 1;

        // The next chunk re-reads the last `overlap` characters
        start = cut - overlap;
    }

    tracing::debug!(
        "Chunked document '{}' into {} chunks (size: {}, overlap: {})",
        document.source_id,
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

/// Split a sequence of documents, preserving document order.
pub fn chunk_documents(
    documents: &[Document],
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(chunk_document(document, chunk_size, overlap)?);
    }
    Ok(chunks)
}

fn make_chunk(chars: &[char], document: &Document, position: u32) -> Chunk {
    Chunk {
        text: chars.iter().collect(),
        source_id: document.source_id.clone(),
        position,
    }
}

/// Pick a cut offset within the window, in characters.
///
/// A candidate must leave the next chunk a strictly later start, so cuts at
/// or before `overlap` characters are rejected.
fn find_cut(window: &str, overlap: usize, chunk_size: usize) -> usize {
    if let Some(cut) = pattern_cut(window, &["\n\n"], overlap) {
        return cut;
    }
    if let Some(cut) = pattern_cut(window, &[". ", "! ", "? ", ".\n"], overlap) {
        return cut;
    }
    if let Some(cut) = word_cut(window, overlap) {
        return cut;
    }
    chunk_size
}

/// Find the rightmost cut just after any of the given patterns.
fn pattern_cut(window: &str, patterns: &[&str], min_chars: usize) -> Option<usize> {
    let mut best: Option<usize> = None;

    for pattern in patterns {
        if let Some((byte_idx, _)) = window.rmatch_indices(*pattern).next() {
            let cut = window[..byte_idx + pattern.len()].chars().count();
            if cut > min_chars && best.map_or(true, |b| cut > b) {
                best = Some(cut);
            }
        }
    }

    best
}

/// Find the rightmost Unicode word boundary in the window.
fn word_cut(window: &str, min_chars: usize) -> Option<usize> {
    let mut char_pos = 0usize;
    let mut best = None;

    for (_, segment) in window.split_word_bound_indices() {
        if char_pos > min_chars {
            best = Some(char_pos);
        }
        char_pos += segment.chars().count();
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            source_id: "test-doc".to_string(),
        }
    }

    /// Rebuild the original content by stripping each chunk's overlap.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut content = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                content.push_str(&chunk.text);
            } else {
                content.extend(chunk.text.chars().skip(overlap));
            }
        }
        content
    }

    #[test]
    fn test_short_content_single_chunk() {
        let document = doc("short text");
        let chunks = chunk_document(&document, 100, 10).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
        assert_eq!(chunks[0].source_id, "test-doc");
        assert_eq!(chunks[0].position, 0);
    }

    #[test]
    fn test_reconstruction_exact() {
        let content = "The quick brown fox jumps over the lazy dog. \
                       Pack my box with five dozen liquor jugs. \
                       How vexingly quick daft zebras jump!\n\n\
                       Sphinx of black quartz, judge my vow. \
                       The five boxing wizards jump quickly.";
        let document = doc(content);
        let chunks = chunk_document(&document, 50, 10).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, 10), content);
    }

    #[test]
    fn test_exact_overlap_between_consecutive_chunks() {
        let content = "word ".repeat(100);
        let document = doc(&content);
        let overlap = 12;
        let chunks = chunk_document(&document, 60, overlap).unwrap();

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count() - overlap)
                .collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_chunk_length_bounded() {
        let content = "a".repeat(955);
        let document = doc(&content);
        let chunks = chunk_document(&document, 100, 20).unwrap();

        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks, 20), content);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let content = format!("{}\n\n{}", "a".repeat(30), "b".repeat(30));
        let document = doc(&content);
        let chunks = chunk_document(&document, 40, 5).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(reconstruct(&chunks, 5), content);
    }

    #[test]
    fn test_prefers_sentence_end_over_word() {
        let content = format!("{}. {}", "Sentence one is here", "and then more words follow on");
        let document = doc(&content);
        let chunks = chunk_document(&document, 30, 4).unwrap();

        assert!(chunks[0].text.ends_with(". "));
        assert_eq!(reconstruct(&chunks, 4), content);
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let content = "x".repeat(250);
        let document = doc(&content);
        let chunks = chunk_document(&document, 100, 0).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 100);
        assert_eq!(reconstruct(&chunks, 0), content);
    }

    #[test]
    fn test_no_identical_consecutive_chunks() {
        let content: String = (0..120).map(|i| format!("word{} ", i)).collect();
        let document = doc(&content);
        let chunks = chunk_document(&document, 50, 25).unwrap();

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_ne!(pair[0].text, pair[1].text);
        }
    }

    #[test]
    fn test_positions_are_sequential() {
        let content = "word ".repeat(100);
        let document = doc(&content);
        let chunks = chunk_document(&document, 60, 10).unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i as u32);
        }
    }

    #[test]
    fn test_multibyte_content_reconstructs() {
        let content = "déjà vu encore une fois! ".repeat(20);
        let document = doc(&content);
        let chunks = chunk_document(&document, 40, 8).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, 8), content);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let document = doc("some text");
        assert!(chunk_document(&document, 10, 10).is_err());
        assert!(chunk_document(&document, 10, 20).is_err());
        assert!(chunk_document(&document, 0, 0).is_err());
    }

    #[test]
    fn test_empty_content_yields_no_chunks() {
        let document = doc("");
        let chunks = chunk_document(&document, 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_documents_preserves_order() {
        let documents = vec![
            Document {
                content: "first document".to_string(),
                source_id: "a".to_string(),
            },
            Document {
                content: "second document".to_string(),
                source_id: "b".to_string(),
            },
        ];

        let chunks = chunk_documents(&documents, 100, 10).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source_id, "a");
        assert_eq!(chunks[1].source_id, "b");
    }
}
