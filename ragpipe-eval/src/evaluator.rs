//! The memoizing evaluation driver.
//!
//! An [`Evaluator`] owns one pipeline bound to a dedicated evaluation
//! collection. The first evaluation call seeds that collection with the
//! source corpus; every evaluation result is computed once and then served
//! from a single-assignment cell for the rest of the evaluator's life.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ragpipe_rag::RagPipeline;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::dataset::{GenerationSample, RetrievalSample, load_generation, load_retrieval, read_text};
use crate::error::{EvalError, Result};
use crate::generation;
use crate::report::{GenerationEvaluationResult, RetrievalEvaluationResult};
use crate::retrieval;

/// Default number of chunks retrieved per question.
pub const DEFAULT_EVAL_TOP_K: usize = 5;

/// File locations and retrieval depth for an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalSettings {
    /// Plain-text document ingested into the evaluation collection.
    pub source_data_path: PathBuf,
    pub retrieval_data_path: PathBuf,
    pub generation_data_path: PathBuf,
    pub top_k: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            source_data_path: PathBuf::from("data/source.txt"),
            retrieval_data_path: PathBuf::from("data/retrieval_eval.json"),
            generation_data_path: PathBuf::from("data/generation_eval.json"),
            top_k: DEFAULT_EVAL_TOP_K,
        }
    }
}

/// How the evaluation collection came to hold the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusStatus {
    /// This evaluator ingested the corpus.
    Ingested { chunk_count: usize },
    /// The collection already existed, so ingestion was skipped.
    AlreadyPresent,
}

/// Lifecycle of an [`Evaluator`].
///
/// `retrieval_scored` and `generation_scored` are independent; either can be
/// reached first and neither is ever cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Uninitialized,
    CorpusLoaded { retrieval_scored: bool, generation_scored: bool },
}

/// Drives a [`RagPipeline`] against labeled datasets.
///
/// Concurrent first calls are serialized by the cells: the corpus is
/// ingested at most once and each result is scored at most once. A failed
/// attempt leaves its cell empty, so a later call retries it.
pub struct Evaluator {
    pipeline: Arc<RagPipeline>,
    settings: EvalSettings,
    corpus: OnceCell<CorpusStatus>,
    // Set once this evaluator has started an ingest. From then on an existing
    // collection may be a partial write of ours, so it no longer proves seeding.
    seeding_attempted: AtomicBool,
    retrieval: OnceCell<Arc<RetrievalEvaluationResult>>,
    generation: OnceCell<Arc<GenerationEvaluationResult>>,
}

impl Evaluator {
    /// Create an evaluator over `pipeline`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Settings`] if `settings.top_k` is zero.
    pub fn new(pipeline: Arc<RagPipeline>, settings: EvalSettings) -> Result<Self> {
        if settings.top_k == 0 {
            return Err(EvalError::Settings("top_k must be greater than zero".to_string()));
        }
        Ok(Self {
            pipeline,
            settings,
            corpus: OnceCell::new(),
            seeding_attempted: AtomicBool::new(false),
            retrieval: OnceCell::new(),
            generation: OnceCell::new(),
        })
    }

    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EvaluatorState {
        if !self.corpus.initialized() {
            return EvaluatorState::Uninitialized;
        }
        EvaluatorState::CorpusLoaded {
            retrieval_scored: self.retrieval.initialized(),
            generation_scored: self.generation.initialized(),
        }
    }

    /// Make sure the evaluation collection holds the source corpus.
    ///
    /// Ingestion is skipped when the collection already exists in the store
    /// before this evaluator ever tried to seed it, and never repeated once
    /// the corpus is loaded. A failed ingest deletes the collection it
    /// created, and every retry after a failure ingests again.
    pub async fn ensure_corpus(&self) -> Result<CorpusStatus> {
        self.corpus
            .get_or_try_init(|| async {
                let collection = self.pipeline.collection();
                let existed =
                    self.pipeline.collection_exists().await.map_err(EvalError::CorpusIngestion)?;
                if existed && !self.seeding_attempted.load(Ordering::SeqCst) {
                    info!(collection, "evaluation collection already present, skipping ingestion");
                    return Ok(CorpusStatus::AlreadyPresent);
                }

                let text = read_text(&self.settings.source_data_path).await?;
                self.seeding_attempted.store(true, Ordering::SeqCst);
                let report = match self.pipeline.ingest(&text).await {
                    Ok(report) => report,
                    Err(e) => {
                        if !existed {
                            self.roll_back_partial_corpus().await;
                        }
                        return Err(EvalError::CorpusIngestion(e));
                    }
                };
                info!(
                    collection,
                    chunk_count = report.chunk_count,
                    path = %self.settings.source_data_path.display(),
                    "evaluation corpus ingested"
                );
                Ok::<_, EvalError>(CorpusStatus::Ingested { chunk_count: report.chunk_count })
            })
            .await
            .copied()
    }

    async fn roll_back_partial_corpus(&self) {
        if let Err(e) = self.pipeline.reset().await {
            warn!(
                collection = self.pipeline.collection(),
                error = %e,
                "failed to remove partially seeded collection"
            );
        }
    }

    /// Score retrieval against `dataset`, or return the cached result.
    ///
    /// Once a result is cached, `dataset` is ignored.
    pub async fn evaluate_retrieval(
        &self,
        dataset: &[RetrievalSample],
    ) -> Result<Arc<RetrievalEvaluationResult>> {
        self.retrieval
            .get_or_try_init(|| async {
                self.ensure_corpus().await?;
                let result =
                    retrieval::evaluate_retrieval(&self.pipeline, dataset, self.settings.top_k)
                        .await?;
                Ok::<_, EvalError>(Arc::new(result))
            })
            .await
            .cloned()
    }

    /// Score generation against `dataset`, or return the cached result.
    ///
    /// Once a result is cached, `dataset` is ignored.
    pub async fn evaluate_generation(
        &self,
        dataset: &[GenerationSample],
    ) -> Result<Arc<GenerationEvaluationResult>> {
        self.generation
            .get_or_try_init(|| async {
                self.ensure_corpus().await?;
                let result = generation::evaluate_generation(&self.pipeline, dataset).await?;
                Ok::<_, EvalError>(Arc::new(result))
            })
            .await
            .cloned()
    }

    /// Retrieval result for the configured dataset file.
    ///
    /// The file is only read when no result is cached yet.
    pub async fn retrieval_report(&self) -> Result<Arc<RetrievalEvaluationResult>> {
        if let Some(result) = self.retrieval.get() {
            return Ok(Arc::clone(result));
        }
        let dataset = load_retrieval(&self.settings.retrieval_data_path).await?;
        self.evaluate_retrieval(&dataset).await
    }

    /// Generation result for the configured dataset file.
    ///
    /// The file is only read when no result is cached yet.
    pub async fn generation_report(&self) -> Result<Arc<GenerationEvaluationResult>> {
        if let Some(result) = self.generation.get() {
            return Ok(Arc::clone(result));
        }
        let dataset = load_generation(&self.settings.generation_data_path).await?;
        self.evaluate_generation(&dataset).await
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("collection", &self.pipeline.collection())
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}
