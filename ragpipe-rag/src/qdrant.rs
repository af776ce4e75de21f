//! Qdrant storage for chunk embeddings.
//!
//! Talks to a Qdrant server over gRPC. Each point carries the chunk id as
//! its numeric point id and `{id, text}` as its payload.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragpipe_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334")?;
//! store.create_collection("docs", 768).await?;
//! store.upsert("docs", &points).await?;
//! let hits = store.search("docs", &query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;

use crate::document::{ChunkPayload, Point, ScoredPoint};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance and numeric point ids. The chunk id and
/// text are stored as the point payload.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStore { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn malformed(message: String) -> RagError {
        RagError::VectorStore { backend: "qdrant".to_string(), message }
    }

    fn to_payload(payload: &ChunkPayload) -> Result<Payload> {
        let value = serde_json::to_value(payload)
            .map_err(|e| Self::malformed(format!("failed to encode payload: {e}")))?;
        Payload::try_from(value).map_err(Self::map_err)
    }

    fn extract_u64(value: &QdrantValue) -> Option<u64> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let points = points
            .iter()
            .map(|point| {
                Ok(PointStruct::new(point.id, point.vector.clone(), Self::to_payload(&point.payload)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let count = points.len();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count, "upserted points to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        response
            .result
            .into_iter()
            .map(|scored| {
                let id = match scored.id.as_ref().and_then(|pid| pid.point_id_options.as_ref()) {
                    Some(PointIdOptions::Num(n)) => *n,
                    other => return Err(Self::malformed(format!("unexpected point id {other:?}"))),
                };
                let chunk_id = scored
                    .payload
                    .get("id")
                    .and_then(Self::extract_u64)
                    .ok_or_else(|| Self::malformed(format!("point {id} has no numeric 'id' payload")))?;
                let text = scored
                    .payload
                    .get("text")
                    .and_then(Self::extract_string)
                    .ok_or_else(|| Self::malformed(format!("point {id} has no 'text' payload")))?;

                Ok(ScoredPoint { id, payload: ChunkPayload { id: chunk_id, text }, score: scored.score })
            })
            .collect()
    }
}
