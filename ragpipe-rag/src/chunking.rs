//! Word-window document chunking.
//!
//! Text is split on whitespace and cut into windows of `chunk_size` tokens.
//! Consecutive windows start `chunk_size - chunk_overlap` tokens apart, so
//! each window repeats the last `chunk_overlap` tokens of the previous one.
//! The final window may be shorter than `chunk_size`.

use tracing::debug;

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Splits text into overlapping windows of whitespace-delimited tokens.
///
/// Construction validates the parameters, so [`chunk`](WordWindowChunker::chunk)
/// itself cannot fail and always terminates.
///
/// # Example
///
/// ```rust
/// use ragpipe_rag::WordWindowChunker;
///
/// let chunker = WordWindowChunker::new(2, 1).unwrap();
/// let chunks = chunker.chunk("a b c d");
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["a b", "b c", "c d"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WordWindowChunker {
    /// Create a new `WordWindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: number of tokens per chunk, must be positive
    /// * `chunk_overlap`: tokens shared between neighbours, must be below `chunk_size`
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] when the window step
    /// `chunk_size - chunk_overlap` would not be positive.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Number of tokens per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of tokens shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance in tokens between the starts of consecutive windows.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Split `text` into chunks with sequential ids starting at 0.
    ///
    /// Returns an empty `Vec` if the text contains no tokens.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(Chunk { id: chunks.len() as u64, text: words[start..end].join(" ") });
            if end == words.len() {
                break;
            }
            start += self.step();
        }

        debug!(word_count = words.len(), chunk_count = chunks.len(), "chunked text");
        chunks
    }
}

/// Chunk `text` with the given window parameters.
///
/// # Errors
///
/// Returns [`RagError::Config`] for a non-positive window step.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    Ok(WordWindowChunker::new(chunk_size, chunk_overlap)?.chunk(text))
}
