//! Builds the service graph from an [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ragpipe_eval::Evaluator;
use ragpipe_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerator};
use ragpipe_rag::qdrant::QdrantVectorStore;
use ragpipe_rag::{
    EmbeddingProvider, InMemoryVectorStore, RagPipeline, TextGenerator, VectorStore,
};
use ragpipe_server::AppState;
use tracing::info;

use crate::config::AppConfig;

/// Where vectors are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Qdrant,
    /// Process-local; everything is lost on exit.
    Memory,
}

fn embedding_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider = OllamaEmbeddingProvider::new(
        &config.ollama.base_url,
        config.embedding.model_name.clone(),
        config.embedding.model_dimension,
    )?
    .with_endpoint(&config.ollama.base_url, &config.embedding.endpoint)
    .with_timeout(Duration::from_secs(config.ollama.timeout_secs))?;
    Ok(Arc::new(provider))
}

fn generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let generator = OllamaGenerator::new(&config.ollama.base_url, config.generator.model_name.clone())?
        .with_endpoint(&config.ollama.base_url, &config.generator.endpoint)
        .with_temperature(config.generator.temperature)
        .with_timeout(Duration::from_secs(config.ollama.timeout_secs))?;
    Ok(Arc::new(generator))
}

fn vector_store(config: &AppConfig, backend: StoreBackend) -> anyhow::Result<Arc<dyn VectorStore>> {
    Ok(match backend {
        StoreBackend::Qdrant => Arc::new(
            QdrantVectorStore::new(&config.qdrant.url)
                .with_context(|| format!("failed to connect to Qdrant at {}", config.qdrant.url))?,
        ),
        StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    })
}

/// Build the API pipeline and the evaluator over shared gateways.
///
/// The two pipelines differ only in their collection.
pub fn build_state(config: &AppConfig, backend: StoreBackend) -> anyhow::Result<AppState> {
    let rag_config = config.rag_config()?;
    let embedder = embedding_provider(config)?;
    let generator = generator(config)?;
    let store = vector_store(config, backend)?;

    let pipeline_for = |collection: &str| {
        RagPipeline::builder()
            .config(rag_config.clone())
            .collection(collection)
            .embedding_provider(embedder.clone())
            .vector_store(store.clone())
            .generator(generator.clone())
            .build()
            .with_context(|| format!("failed to build pipeline for collection '{collection}'"))
    };

    let pipeline = Arc::new(pipeline_for(&config.api.collection)?);
    let eval_pipeline = Arc::new(pipeline_for(&config.evaluation.collection_name)?);
    let evaluator = Arc::new(Evaluator::new(eval_pipeline, config.eval_settings())?);

    info!(
        ?backend,
        collection = %config.api.collection,
        eval_collection = %config.evaluation.collection_name,
        embedding_model = %config.embedding.model_name,
        generator_model = %config.generator.model_name,
        "services ready"
    );
    Ok(AppState { pipeline, evaluator })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_builds_both_pipelines() {
        let mut config = AppConfig::default();
        config.evaluation.collection_name = "scoring".to_string();

        let state = build_state(&config, StoreBackend::Memory).unwrap();

        assert_eq!(state.pipeline.collection(), "documents");
        assert_eq!(state.evaluator.pipeline().collection(), "scoring");
        assert_eq!(state.pipeline.config().dimensions, 768);
        assert_eq!(state.evaluator.settings().top_k, config.retrieval.top_k);
    }
}
