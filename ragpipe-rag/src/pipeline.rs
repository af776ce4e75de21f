//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest, retrieve and answer workflows
//! by composing a [`WordWindowChunker`], an [`EmbeddingProvider`], a
//! [`VectorStore`] and a [`TextGenerator`]. A pipeline is bound to one
//! collection for its whole life.
//!
//! Every stage runs in sequence and nothing is retried: the first failing
//! stage is logged and surfaces as a stage-named [`RagError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragpipe_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .collection("documents")
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! pipeline.ingest(&text).await?;
//! let answer = pipeline.answer("Who is Jim Hawkins?").await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chunking::WordWindowChunker;
use crate::config::RagConfig;
use crate::document::{Answer, IngestReport, Point, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, RetrievalStage};
use crate::generation::TextGenerator;
use crate::prompt::{context_prompt, direct_prompt};
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Holds only configuration and shared gateway handles, so one instance can
/// serve concurrent callers. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    collection: String,
    chunker: WordWindowChunker,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    generator: Arc<dyn TextGenerator>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The collection this pipeline reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Report whether the bound collection already exists in the store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreFailed`] if the store cannot be queried.
    pub async fn collection_exists(&self) -> Result<bool> {
        self.vector_store.collection_exists(&self.collection).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "collection lookup failed");
            RagError::store_failed(&self.collection, e)
        })
    }

    /// Create the bound collection with the configured dimension if it is missing.
    async fn ensure_collection(&self) -> Result<()> {
        if self.collection_exists().await? {
            return Ok(());
        }
        self.vector_store
            .create_collection(&self.collection, self.config.dimensions)
            .await
            .map_err(|e| {
                error!(collection = %self.collection, error = %e, "failed to create collection");
                RagError::store_failed(&self.collection, e)
            })?;
        info!(collection = %self.collection, dimensions = self.config.dimensions, "created collection");
        Ok(())
    }

    /// Check that a batch of vectors matches the configured shape.
    fn check_embeddings(&self, embeddings: &[Vec<f32>], expected_count: usize) -> Result<()> {
        if embeddings.len() != expected_count {
            return Err(RagError::DimensionMismatch {
                what: "vector count",
                expected: expected_count,
                actual: embeddings.len(),
            });
        }
        match embeddings.iter().find(|e| e.len() != self.config.dimensions) {
            Some(bad) => Err(RagError::DimensionMismatch {
                what: "vector length",
                expected: self.config.dimensions,
                actual: bad.len(),
            }),
            None => Ok(()),
        }
    }

    /// Ingest a document: chunk → embed → ensure collection → upsert.
    ///
    /// # Errors
    ///
    /// - [`RagError::ChunkingFailed`] if the text has no tokens; nothing
    ///   downstream is attempted.
    /// - [`RagError::EmbeddingFailed`] if the batch embedding call fails or
    ///   returns vectors of the wrong count or length.
    /// - [`RagError::StoreFailed`] if collection creation or upsert fails.
    pub async fn ingest(&self, text: &str) -> Result<IngestReport> {
        // 1. Chunk the document
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            error!(collection = %self.collection, "chunking produced no chunks");
            return Err(RagError::ChunkingFailed);
        }

        // 2. Embed all chunk texts as one batch
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self
            .embedding_provider
            .embed_batch(&texts)
            .await
            .and_then(|embeddings| {
                self.check_embeddings(&embeddings, texts.len())?;
                Ok(embeddings)
            })
            .map_err(|e| {
                error!(collection = %self.collection, error = %e, "embedding failed during ingestion");
                RagError::embedding_failed(e)
            })?;

        // 3. Make sure the collection exists
        self.ensure_collection().await?;

        // 4. Upsert points keyed by chunk id
        let points: Vec<Point> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| Point { id: chunk.id, vector, payload: chunk.into() })
            .collect();

        self.vector_store.upsert(&self.collection, &points).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "upsert failed during ingestion");
            RagError::store_failed(&self.collection, e)
        })?;

        let chunk_count = points.len();
        info!(collection = %self.collection, chunk_count, "ingested document");

        Ok(IngestReport { collection: self.collection.clone(), chunk_count })
    }

    /// Retrieve the `top_k` chunks most similar to `query`.
    ///
    /// Results keep the store's order and scores.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidRequest`] if `top_k` is zero.
    /// - [`RagError::RetrievalFailed`] naming the embedding or search stage.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidRequest("top_k must be greater than zero".to_string()));
        }

        // 1. Embed the query
        let query_embedding = self
            .embedding_provider
            .embed(query)
            .await
            .and_then(|embedding| {
                self.check_embeddings(std::slice::from_ref(&embedding), 1)?;
                Ok(embedding)
            })
            .map_err(|e| {
                error!(error = %e, "embedding failed during query");
                RagError::retrieval_failed(RetrievalStage::Embedding, e)
            })?;

        // 2. Search the vector store
        let points =
            self.vector_store.search(&self.collection, &query_embedding, top_k).await.map_err(
                |e| {
                    error!(collection = %self.collection, error = %e, "vector store search failed");
                    RagError::retrieval_failed(RetrievalStage::Search, e)
                },
            )?;

        let results: Vec<RetrievalResult> = points.into_iter().map(RetrievalResult::from).collect();
        debug!(top_k, result_count = results.len(), "retrieval completed");

        Ok(results)
    }

    /// Answer `query` from retrieved context.
    ///
    /// Retrieves [`RagConfig::answer_top_k`] chunks and passes their texts,
    /// in retrieval order, to the generator.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::RetrievalFailed`] from retrieval and returns
    /// [`RagError::GenerationFailed`] if the completion call fails.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let results = self.retrieve(query, self.config.answer_top_k).await?;
        let contexts: Vec<String> = results.into_iter().map(|r| r.text).collect();

        let prompt = context_prompt(query, &contexts);
        let text = self.generator.complete(&prompt).await.map_err(|e| {
            error!(error = %e, "generation failed");
            RagError::generation_failed(e)
        })?;

        info!(context_count = contexts.len(), "answered with retrieval");
        Ok(Answer { text, contexts })
    }

    /// Answer `query` without retrieval.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationFailed`] if the completion call fails.
    pub async fn answer_direct(&self, query: &str) -> Result<String> {
        let text = self.generator.complete(&direct_prompt(query)).await.map_err(|e| {
            error!(error = %e, "direct generation failed");
            RagError::generation_failed(e)
        })?;

        info!("answered without retrieval");
        Ok(text)
    }

    /// Delete the bound collection and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreFailed`] if the store operation fails.
    pub async fn reset(&self) -> Result<()> {
        self.vector_store.delete_collection(&self.collection).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to delete collection");
            RagError::store_failed(&self.collection, e)
        })?;
        info!(collection = %self.collection, "deleted collection");
        Ok(())
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required except `config`, which defaults to
/// [`RagConfig::default()`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    collection: Option<String>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the collection the pipeline is bound to.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the text generator.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, the
    /// configuration is invalid, or the embedding provider's dimension
    /// differs from the configured one.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let collection = self
            .collection
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| RagError::Config("collection is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;

        if embedding_provider.dimensions() != config.dimensions {
            return Err(RagError::Config(format!(
                "embedding provider produces {} dimensions but the collection is configured for {}",
                embedding_provider.dimensions(),
                config.dimensions
            )));
        }

        let chunker = WordWindowChunker::new(config.chunk_size, config.chunk_overlap)?;

        Ok(RagPipeline { config, collection, chunker, embedding_provider, vector_store, generator })
    }
}
