//! Data types for chunks, stored points, and retrieval results.

use serde::{Deserialize, Serialize};

/// A contiguous window of a source document produced by the chunker.
///
/// Ids are sequential from zero in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within its document.
    pub id: u64,
    /// The chunk's tokens joined by single spaces.
    pub text: String,
}

/// The payload stored next to each vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkPayload {
    /// The id of the chunk this point was built from.
    pub id: u64,
    /// The chunk text.
    pub text: String,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self { id: chunk.id, text: chunk.text.clone() }
    }
}

/// A point handed to a [`VectorStore`](crate::VectorStore) for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Point id, equal to the chunk id.
    pub id: u64,
    /// The chunk's embedding.
    pub vector: Vec<f32>,
    /// The chunk's id and text.
    pub payload: ChunkPayload,
}

/// A point returned from a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    /// Point id as stored.
    pub id: u64,
    /// The stored payload.
    pub payload: ChunkPayload,
    /// Similarity reported by the store (higher is more relevant).
    pub score: f32,
}

/// A retrieved chunk with the store's similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The id recorded in the point payload.
    pub chunk_id: u64,
    /// The chunk text.
    pub text: String,
    /// Similarity as reported by the vector store, not re-normalised.
    pub score: f32,
}

impl From<ScoredPoint> for RetrievalResult {
    fn from(point: ScoredPoint) -> Self {
        Self { chunk_id: point.payload.id, text: point.payload.text, score: point.score }
    }
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// The collection the points were written to.
    pub collection: String,
    /// Number of chunks embedded and stored.
    pub chunk_count: usize,
}

/// A generated answer together with the context it was conditioned on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated text.
    pub text: String,
    /// Context segments in the order they appeared in the prompt.
    pub contexts: Vec<String>,
}
