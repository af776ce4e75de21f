//! Labeled evaluation datasets.
//!
//! Both dataset kinds are JSON arrays:
//!
//! ```json
//! [{"question": "...", "expected_answer": "...", "relevant_chunks": [{"id": 3}]}]
//! [{"question": "...", "answer": "..."}]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EvalError, Result};

/// A reference to a chunk that answers a question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelevantChunk {
    pub id: u64,
}

/// One retrieval question with the chunks expected to answer it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSample {
    pub question: String,
    #[serde(alias = "answer", default)]
    pub expected_answer: String,
    #[serde(default)]
    pub relevant_chunks: Vec<RelevantChunk>,
}

impl RetrievalSample {
    /// The expected chunk ids as a set.
    pub fn expected_ids(&self) -> BTreeSet<u64> {
        self.relevant_chunks.iter().map(|c| c.id).collect()
    }
}

/// One question with its reference answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSample {
    pub question: String,
    pub answer: String,
}

/// An ordered list of retrieval samples.
pub type RetrievalDataset = Vec<RetrievalSample>;

/// An ordered list of generation samples.
pub type GenerationDataset = Vec<GenerationSample>;

fn parse<T: DeserializeOwned>(json: &str, origin: &str) -> Result<Vec<T>> {
    serde_json::from_str(json)
        .map_err(|source| EvalError::Dataset { origin: origin.to_string(), source })
}

/// Read a UTF-8 file into a string.
pub async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EvalError::Io { path: path.to_path_buf(), source })
}

/// Parse a retrieval dataset from JSON text.
pub fn parse_retrieval(json: &str) -> Result<RetrievalDataset> {
    parse(json, "<inline>")
}

/// Parse a generation dataset from JSON text.
pub fn parse_generation(json: &str) -> Result<GenerationDataset> {
    parse(json, "<inline>")
}

/// Load a retrieval dataset from a JSON file.
pub async fn load_retrieval(path: &Path) -> Result<RetrievalDataset> {
    let dataset: RetrievalDataset = parse(&read_text(path).await?, &path.display().to_string())?;
    info!(path = %path.display(), questions = dataset.len(), "loaded retrieval dataset");
    Ok(dataset)
}

/// Load a generation dataset from a JSON file.
pub async fn load_generation(path: &Path) -> Result<GenerationDataset> {
    let dataset: GenerationDataset = parse(&read_text(path).await?, &path.display().to_string())?;
    info!(path = %path.display(), questions = dataset.len(), "loaded generation dataset");
    Ok(dataset)
}
