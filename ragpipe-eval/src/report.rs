//! Evaluation result types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One scored retrieval question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalTestCase {
    pub question: String,
    pub expected_answer: String,
    pub expected_chunk_ids: BTreeSet<u64>,
    /// Ids in the order the store returned them.
    pub retrieved_chunk_ids: Vec<u64>,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-question retrieval scores and their means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalEvaluationResult {
    pub test_cases: Vec<RetrievalTestCase>,
    pub avg_precision: f64,
    pub avg_recall: f64,
    pub avg_f1: f64,
}

/// One scored generation question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTestCase {
    pub question: String,
    pub ground_truth: String,
    pub generated_answer: String,
    /// Context segments the answer was generated from.
    pub source_chunks: Vec<String>,
    pub ground_truth_embedding: Vec<f32>,
    pub generated_embedding: Vec<f32>,
    pub similarity_score: f64,
}

/// Per-question similarity scores and their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationEvaluationResult {
    pub test_cases: Vec<GenerationTestCase>,
    pub avg_similarity_score: f64,
}
