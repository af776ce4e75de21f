//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Number of segments retrieved as context for [`RagPipeline::answer`](crate::RagPipeline::answer).
pub const DEFAULT_ANSWER_TOP_K: usize = 3;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of whitespace-delimited tokens per chunk.
    pub chunk_size: usize,
    /// Number of tokens shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Length of every embedding vector stored in the collection.
    pub dimensions: usize,
    /// Number of context segments retrieved when answering a question.
    pub answer_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 300, chunk_overlap: 30, dimensions: 768, answer_top_k: DEFAULT_ANSWER_TOP_K }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `dimensions == 0`
    /// - `answer_top_k == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.dimensions == 0 {
            return Err(RagError::Config("dimensions must be greater than zero".to_string()));
        }
        if self.answer_top_k == 0 {
            return Err(RagError::Config("answer_top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the chunk size in tokens.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in tokens.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the embedding dimensionality of the collection.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set how many segments are retrieved as answer context.
    pub fn answer_top_k(mut self, k: usize) -> Self {
        self.config.answer_top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.answer_top_k, DEFAULT_ANSWER_TOP_K);
        assert_eq!(config.chunk_size, 300);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(10).chunk_overlap(10).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(RagConfig::builder().dimensions(0).build().is_err());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
    }
}
