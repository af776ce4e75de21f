//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Point, ScoredPoint};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Point`]s and support
/// upserting and searching by vector similarity.
///
/// # Example
///
/// ```rust,ignore
/// use ragpipe_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// if !store.collection_exists("docs").await? {
///     store.create_collection("docs", 768).await?;
/// }
/// store.upsert("docs", &points).await?;
/// let hits = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Report whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a named collection holding vectors of `dimensions` length.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or replace points, keyed by point id.
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()>;

    /// Search for the `limit` points most similar to `vector`.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;
}
