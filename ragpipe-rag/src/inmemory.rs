//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a dependency-free vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and the CLI's `--memory` mode.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Point, ScoredPoint};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    points: BTreeMap<u64, Point>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as collection name → point id → point. Each
/// collection remembers the dimension it was created with and rejects
/// vectors of any other length.
///
/// # Example
///
/// ```rust,ignore
/// use ragpipe_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points stored in `collection`, or `None` if it does not exist.
    pub async fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections.read().await.get(collection).map(|c| c.points.len())
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStore {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }

    fn wrong_dimension(expected: usize, actual: usize) -> RagError {
        RagError::VectorStore {
            backend: "InMemory".to_string(),
            message: format!("expected vector of dimension {expected}, got {actual}"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, points: BTreeMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != store.dimensions) {
            return Err(Self::wrong_dimension(store.dimensions, bad.vector.len()));
        }
        for point in points {
            store.points.insert(point.id, point.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;
        if vector.len() != store.dimensions {
            return Err(Self::wrong_dimension(store.dimensions, vector.len()));
        }

        let mut scored: Vec<ScoredPoint> = store
            .points
            .values()
            .map(|point| ScoredPoint {
                id: point.id,
                payload: point.payload.clone(),
                score: cosine_similarity(&point.vector, vector),
            })
            .collect();

        // Stable sort keeps ascending id order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkPayload;

    fn point(id: u64, vector: Vec<f32>) -> Point {
        Point { id, vector, payload: ChunkPayload { id, text: format!("chunk {id}") } }
    }

    #[tokio::test]
    async fn create_is_idempotent_and_keeps_points() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("c").await.unwrap());
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[point(0, vec![1.0, 0.0])]).await.unwrap();
        store.create_collection("c", 2).await.unwrap();

        assert!(store.collection_exists("c").await.unwrap());
        assert_eq!(store.point_count("c").await, Some(1));
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[point(0, vec![1.0, 0.0])]).await.unwrap();
        store.upsert("c", &[point(0, vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.point_count("c").await, Some(1));
        let hits = store.search("c", &[0.0, 1.0], 1).await.unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_orders_by_descending_score() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store
            .upsert("c", &[point(0, vec![0.0, 1.0]), point(1, vec![1.0, 0.0]), point(2, vec![1.0, 1.0])])
            .await
            .unwrap();

        let hits = store.search("c", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(hits[0].payload.text, "chunk 1");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 3).await.unwrap();

        let err = store.upsert("c", &[point(0, vec![1.0, 0.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
        assert!(store.search("c", &[1.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn missing_collection_is_an_error() {
        let store = InMemoryVectorStore::new();
        assert!(store.upsert("nope", &[]).await.is_err());
        assert!(store.search("nope", &[1.0], 1).await.is_err());
    }
}
