//! # ragpipe-rag
//!
//! Retrieval-augmented generation building blocks for the ragpipe service.
//!
//! - [`WordWindowChunker`] splits text into overlapping token windows.
//! - [`EmbeddingProvider`], [`VectorStore`] and [`TextGenerator`] are the
//!   gateway seams; [`ollama`] and [`qdrant`] provide network backends
//!   behind the `ollama` and `qdrant` features, and [`InMemoryVectorStore`]
//!   is always available.
//! - [`RagPipeline`] composes them into ingest, retrieve and answer calls.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod pipeline;
pub mod prompt;
pub mod vectorstore;

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "qdrant")]
pub mod qdrant;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chunking::{WordWindowChunker, chunk_text};
pub use config::{DEFAULT_ANSWER_TOP_K, RagConfig, RagConfigBuilder};
pub use document::{
    Answer, Chunk, ChunkPayload, IngestReport, Point, RetrievalResult, ScoredPoint,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result, RetrievalStage};
pub use generation::TextGenerator;
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use vectorstore::VectorStore;
