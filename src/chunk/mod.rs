//! Text chunking
//!
//! Documents are split recursively: the text is cut on the coarsest separator
//! it contains (paragraphs, then lines, then words, then characters), and the
//! pieces are greedily merged back into chunks of at most `size` characters,
//! carrying up to `overlap` characters of trailing context into the next chunk.
//! Lengths are counted in `char`s, never bytes.

use crate::config::ChunkConfig;
use crate::load::SourceDocument;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Separators tried in order, coarsest first. The empty separator splits into characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Metadata carried by every stored chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Originating source identifier (file path)
    pub source: String,

    /// Position of the chunk within its document (0-based)
    pub chunk_index: usize,
}

/// A span of source text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable content-derived identifier
    pub id: String,

    /// The chunk text, stored and returned verbatim
    pub text: String,

    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(source: &str, chunk_index: usize, text: String) -> Self {
        Self {
            id: compute_chunk_id(source, chunk_index, &text),
            text,
            metadata: ChunkMetadata {
                source: source.to_string(),
                chunk_index,
            },
        }
    }
}

/// Compute the stable identifier of a chunk
pub fn compute_chunk_id(source: &str, chunk_index: usize, text: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    hasher.update(&[0]);
    hasher.update(&(chunk_index as u64).to_le_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Recursive character splitter
#[derive(Debug, Clone, Copy)]
pub struct RecursiveSplitter {
    size: usize,
    overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self { size, overlap }
    }

    pub fn from_config(config: &ChunkConfig) -> Self {
        Self::new(config.size, config.overlap)
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&str] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily merge small pieces into chunks of at most `size` characters
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.size && !window.is_empty() {
                if total > self.size {
                    debug!(
                        "Created a chunk of {} characters, longer than the limit of {}",
                        total, self.size
                    );
                }
                if let Some(chunk) = join_trimmed(&window) {
                    chunks.push(chunk);
                }

                // Drop leading pieces until only the overlap remains and the next piece fits
                while total > self.overlap || (total + len > self.size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_trimmed(&window) {
            chunks.push(chunk);
        }

        chunks
    }
}

/// Split on `separator`, attaching each separator to the start of the following piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices(separator) {
        if i > start {
            pieces.push(&text[start..i]);
        }
        start = i;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn join_trimmed(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split every document into chunks tagged with their source
pub fn chunk_documents(documents: &[SourceDocument], splitter: &RecursiveSplitter) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| {
            splitter
                .split_text(&doc.text)
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk::new(&doc.source, index, text))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_document_is_single_chunk() {
        let splitter = RecursiveSplitter::new(1000, 200);
        let chunks = splitter.split_text("Data Scientist requires Python, SQL, and statistics.\n");
        assert_eq!(
            chunks,
            vec!["Data Scientist requires Python, SQL, and statistics.".to_string()]
        );
    }

    #[test]
    fn test_paragraphs_are_kept_together() {
        let paragraph = |c: char| c.to_string().repeat(300);
        let text = ['a', 'b', 'c', 'd', 'e']
            .iter()
            .map(|c| paragraph(*c))
            .collect::<Vec<_>>()
            .join("\n\n");

        let chunks = RecursiveSplitter::new(1000, 200).split_text(&text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[0].ends_with('c'));
        assert!(chunks[1].starts_with('d'));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_word_overlap_is_carried_forward() {
        let chunks =
            RecursiveSplitter::new(20, 5).split_text("aaaa bbbb cccc dddd eeee ffff");
        assert_eq!(chunks, vec!["aaaa bbbb cccc dddd", "dddd eeee ffff"]);
    }

    #[test]
    fn test_long_line_falls_back_to_words() {
        let line = "word ".repeat(50);
        let text = format!("short intro\n\n{}", line.trim_end());

        let chunks = RecursiveSplitter::new(60, 10).split_text(&text);

        assert_eq!(chunks[0], "short intro");
        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 60);
            assert!(!chunk.starts_with(' '));
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(15);
        let chunks = RecursiveSplitter::new(10, 0).split_text(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[1].chars().count(), 5);
    }

    #[test]
    fn test_whitespace_only_text_produces_nothing() {
        let chunks = RecursiveSplitter::new(100, 10).split_text(" \n\n \n ");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_documents_tags_sources() {
        let docs = vec![
            SourceDocument {
                source: "data/a.txt".to_string(),
                text: "alpha".to_string(),
            },
            SourceDocument {
                source: "data/b.txt".to_string(),
                text: "beta".to_string(),
            },
        ];

        let chunks = chunk_documents(&docs, &RecursiveSplitter::new(1000, 200));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.source, "data/a.txt");
        assert_eq!(chunks[1].metadata.source, "data/b.txt");
        assert_eq!(chunks[1].metadata.chunk_index, 0);
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[test]
    fn test_chunk_id_stability() {
        let a = compute_chunk_id("a.txt", 0, "same text");
        let b = compute_chunk_id("a.txt", 0, "same text");
        let c = compute_chunk_id("a.txt", 1, "same text");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
