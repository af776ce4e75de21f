//! Error types for the `ragpipe-eval` crate.

use std::path::PathBuf;

use ragpipe_rag::RagError;
use thiserror::Error;

/// Errors that can occur while evaluating the pipeline.
///
/// Every variant is terminal for the evaluation call that raised it; no
/// partially scored result is ever returned.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A corpus or dataset file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dataset file is not valid JSON of the expected shape.
    #[error("invalid dataset '{origin}': {source}")]
    Dataset {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Evaluator settings are unusable.
    #[error("invalid evaluation settings: {0}")]
    Settings(String),

    /// Seeding the evaluation collection with the source corpus failed.
    #[error("failed to load evaluation corpus: {0}")]
    CorpusIngestion(#[source] RagError),

    /// A retrieval call failed while scoring; the run is aborted.
    #[error("retrieval evaluation failed on question '{question}': {source}")]
    RetrievalEvaluationFailed {
        question: String,
        #[source]
        source: RagError,
    },

    /// A generation or embedding call failed while scoring; the run is aborted.
    #[error("generation evaluation failed during {stage}: {source}")]
    GenerationEvaluationFailed {
        stage: &'static str,
        #[source]
        source: RagError,
    },

    /// Two vectors could not be compared (empty or different lengths).
    #[error("similarity computation failed: {0}")]
    SimilarityComputationFailed(String),
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
