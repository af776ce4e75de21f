//! Retrieval scoring: precision, recall and F1 against labeled chunk ids.

use ragpipe_rag::RagPipeline;
use tracing::{error, info};

use crate::dataset::RetrievalSample;
use crate::error::{EvalError, Result};
use crate::metrics::{mean, score_retrieval};
use crate::report::{RetrievalEvaluationResult, RetrievalTestCase};

/// Retrieve `top_k` chunks for every sample and score them.
///
/// Samples are processed one at a time in dataset order. The first failed
/// retrieval aborts the run.
pub async fn evaluate_retrieval(
    pipeline: &RagPipeline,
    dataset: &[RetrievalSample],
    top_k: usize,
) -> Result<RetrievalEvaluationResult> {
    let mut test_cases = Vec::with_capacity(dataset.len());

    for sample in dataset {
        let retrieved = pipeline.retrieve(&sample.question, top_k).await.map_err(|source| {
            error!(question = %sample.question, error = %source, "retrieval evaluation aborted");
            EvalError::RetrievalEvaluationFailed { question: sample.question.clone(), source }
        })?;

        let retrieved_chunk_ids: Vec<u64> = retrieved.iter().map(|r| r.chunk_id).collect();
        let expected_chunk_ids = sample.expected_ids();
        let scores = score_retrieval(&expected_chunk_ids, &retrieved_chunk_ids);

        test_cases.push(RetrievalTestCase {
            question: sample.question.clone(),
            expected_answer: sample.expected_answer.clone(),
            expected_chunk_ids,
            retrieved_chunk_ids,
            precision: scores.precision,
            recall: scores.recall,
            f1: scores.f1,
        });
    }

    let result = RetrievalEvaluationResult {
        avg_precision: mean(test_cases.iter().map(|c| c.precision)),
        avg_recall: mean(test_cases.iter().map(|c| c.recall)),
        avg_f1: mean(test_cases.iter().map(|c| c.f1)),
        test_cases,
    };

    info!(
        questions = result.test_cases.len(),
        avg_precision = result.avg_precision,
        avg_recall = result.avg_recall,
        avg_f1 = result.avg_f1,
        "retrieval evaluation completed"
    );
    Ok(result)
}
