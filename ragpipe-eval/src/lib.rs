//! # ragpipe-eval
//!
//! Retrieval and generation quality evaluation for the ragpipe pipeline.
//!
//! Retrieval is scored with precision, recall and F1 over labeled chunk ids.
//! Generation is scored with the cosine similarity between the embedding of
//! the generated answer and the embedding of a reference answer.
//!
//! ```rust,ignore
//! use ragpipe_eval::{EvalSettings, Evaluator};
//!
//! let evaluator = Evaluator::new(pipeline, EvalSettings::default())?;
//! let result = evaluator.retrieval_report().await?;
//! println!("avg F1: {:.3}", result.avg_f1);
//! ```

pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod generation;
pub mod metrics;
pub mod report;
pub mod retrieval;

pub use dataset::{
    GenerationDataset, GenerationSample, RelevantChunk, RetrievalDataset, RetrievalSample,
    load_generation, load_retrieval, parse_generation, parse_retrieval,
};
pub use error::{EvalError, Result};
pub use evaluator::{CorpusStatus, DEFAULT_EVAL_TOP_K, EvalSettings, Evaluator, EvaluatorState};
pub use metrics::{RetrievalScores, cosine_similarity, mean, score_retrieval, true_positives};
pub use report::{
    GenerationEvaluationResult, GenerationTestCase, RetrievalEvaluationResult, RetrievalTestCase,
};
