//! Error types for the `ragpipe-rag` crate.

use std::fmt;

use thiserror::Error;

/// The stage of a retrieval call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    /// Embedding the query text.
    Embedding,
    /// Searching the vector store.
    Search,
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding => f.write_str("embedding"),
            Self::Search => f.write_str("search"),
        }
    }
}

/// Errors that can occur in RAG operations.
///
/// Gateway variants (`Embedding`, `VectorStore`, `Generation`) describe a
/// failure inside a collaborator. The `*Failed` variants name the pipeline
/// stage that was running and keep the gateway error as their source.
#[derive(Debug, Error)]
pub enum RagError {
    /// An embedding backend rejected a request or returned a malformed response.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A text-generation backend failed.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding gateway returned vectors that break the collection's shape.
    #[error("embedding shape mismatch: expected {expected}, got {actual} ({what})")]
    DimensionMismatch {
        /// What was being compared (`vector length` or `vector count`).
        what: &'static str,
        /// The configured value.
        expected: usize,
        /// The value returned by the gateway.
        actual: usize,
    },

    /// Chunking produced no segments for the given text.
    #[error("chunking failed: no chunks were created from the given text")]
    ChunkingFailed,

    /// Batch embedding of chunk texts failed during ingestion.
    #[error("embedding failed: {source}")]
    EmbeddingFailed {
        #[source]
        source: Box<RagError>,
    },

    /// Collection creation or point upsert failed during ingestion.
    #[error("store failed in collection '{collection}': {source}")]
    StoreFailed {
        collection: String,
        #[source]
        source: Box<RagError>,
    },

    /// Query embedding or similarity search failed.
    #[error("retrieval failed at {stage} stage: {source}")]
    RetrievalFailed {
        stage: RetrievalStage,
        #[source]
        source: Box<RagError>,
    },

    /// The generation call failed.
    #[error("generation failed: {source}")]
    GenerationFailed {
        #[source]
        source: Box<RagError>,
    },

    /// A caller passed an argument outside the operation's contract.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn embedding_failed(source: RagError) -> Self {
        Self::EmbeddingFailed { source: Box::new(source) }
    }

    pub(crate) fn store_failed(collection: &str, source: RagError) -> Self {
        Self::StoreFailed { collection: collection.to_string(), source: Box::new(source) }
    }

    pub(crate) fn retrieval_failed(stage: RetrievalStage, source: RagError) -> Self {
        Self::RetrievalFailed { stage, source: Box::new(source) }
    }

    pub(crate) fn generation_failed(source: RagError) -> Self {
        Self::GenerationFailed { source: Box::new(source) }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_name_the_stage_and_keep_the_source() {
        let inner = RagError::Embedding { provider: "Ollama".into(), message: "timeout".into() };
        let err = RagError::retrieval_failed(RetrievalStage::Embedding, inner);

        assert_eq!(
            err.to_string(),
            "retrieval failed at embedding stage: Embedding error (Ollama): timeout"
        );
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Embedding error (Ollama): timeout"));
    }

    #[test]
    fn store_failed_mentions_collection() {
        let inner = RagError::VectorStore { backend: "qdrant".into(), message: "down".into() };
        let err = RagError::store_failed("docs", inner);
        assert!(err.to_string().starts_with("store failed in collection 'docs'"));
    }
}
