//! Generation scoring: cosine similarity between generated and reference answers.

use ragpipe_rag::{RagError, RagPipeline};
use tracing::{error, info};

use crate::dataset::GenerationSample;
use crate::error::{EvalError, Result};
use crate::metrics::{cosine_similarity, mean};
use crate::report::{GenerationEvaluationResult, GenerationTestCase};

fn failed(stage: &'static str) -> impl FnOnce(RagError) -> EvalError {
    move |source| {
        error!(stage, error = %source, "generation evaluation aborted");
        EvalError::GenerationEvaluationFailed { stage, source }
    }
}

/// Embed `texts` as one batch and check one vector came back per text.
async fn embed_all(
    pipeline: &RagPipeline,
    texts: &[&str],
    stage: &'static str,
) -> Result<Vec<Vec<f32>>> {
    let embeddings =
        pipeline.embedding_provider().embed_batch(texts).await.map_err(failed(stage))?;
    if embeddings.len() != texts.len() {
        return Err(failed(stage)(RagError::DimensionMismatch {
            what: "vector count",
            expected: texts.len(),
            actual: embeddings.len(),
        }));
    }
    Ok(embeddings)
}

/// Answer every sample with retrieval and score it against the reference.
///
/// Answers are generated one at a time in dataset order. Reference answers
/// and generated answers are then embedded in two batch calls, so element
/// `i` of each batch belongs to sample `i`.
pub async fn evaluate_generation(
    pipeline: &RagPipeline,
    dataset: &[GenerationSample],
) -> Result<GenerationEvaluationResult> {
    let mut answers = Vec::with_capacity(dataset.len());
    for sample in dataset {
        answers.push(pipeline.answer(&sample.question).await.map_err(failed("answer"))?);
    }

    // An empty batch would be a wasted round-trip.
    let (truth_embeddings, generated_embeddings) = if dataset.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let truths: Vec<&str> = dataset.iter().map(|s| s.answer.as_str()).collect();
        let generated: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
        (
            embed_all(pipeline, &truths, "ground-truth embedding").await?,
            embed_all(pipeline, &generated, "generated-answer embedding").await?,
        )
    };

    let mut test_cases = Vec::with_capacity(dataset.len());
    for (((sample, answer), truth), generated) in
        dataset.iter().zip(answers).zip(truth_embeddings).zip(generated_embeddings)
    {
        let similarity_score = cosine_similarity(&truth, &generated).inspect_err(|e| {
            error!(question = %sample.question, error = %e, "similarity computation failed");
        })?;

        test_cases.push(GenerationTestCase {
            question: sample.question.clone(),
            ground_truth: sample.answer.clone(),
            generated_answer: answer.text,
            source_chunks: answer.contexts,
            ground_truth_embedding: truth,
            generated_embedding: generated,
            similarity_score,
        });
    }

    let avg_similarity_score = mean(test_cases.iter().map(|c| c.similarity_score));
    info!(questions = test_cases.len(), avg_similarity_score, "generation evaluation completed");

    Ok(GenerationEvaluationResult { test_cases, avg_similarity_score })
}
