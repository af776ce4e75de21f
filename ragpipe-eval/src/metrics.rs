//! Retrieval and similarity metrics.
//!
//! Zero denominators are defined rather than left as NaN: precision is 0.0
//! when nothing was retrieved, recall is 0.0 when nothing was expected, and
//! the mean of no values is 0.0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Precision, recall and F1 for one retrieval query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalScores {
    pub true_positives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Count retrieved ids that appear in the expected set.
///
/// Each retrieved position is counted at most once.
pub fn true_positives(expected: &BTreeSet<u64>, retrieved: &[u64]) -> usize {
    retrieved.iter().filter(|id| expected.contains(id)).count()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

/// Score one query's retrieved ids against the expected set.
pub fn score_retrieval(expected: &BTreeSet<u64>, retrieved: &[u64]) -> RetrievalScores {
    let tp = true_positives(expected, retrieved);
    let false_positives = retrieved.len() - tp;
    let false_negatives = expected.len().saturating_sub(tp);

    let precision = ratio(tp, tp + false_positives);
    let recall = ratio(tp, tp + false_negatives);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RetrievalScores { true_positives: tp, precision, recall, f1 }
}

/// Cosine similarity `dot(a, b) / (‖a‖ · ‖b‖)` in `f64`.
///
/// # Errors
///
/// Returns [`EvalError::SimilarityComputationFailed`] if either vector is
/// empty, the lengths differ, or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(EvalError::SimilarityComputationFailed("vectors must not be empty".into()));
    }
    if a.len() != b.len() {
        return Err(EvalError::SimilarityComputationFailed(format!(
            "vector lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(EvalError::SimilarityComputationFailed("zero-magnitude vector".into()));
    }

    // Rounding can push identical vectors a hair past 1.
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Arithmetic mean, 0.0 for no values.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn set(ids: &[u64]) -> BTreeSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn partial_overlap_scores() {
        let scores = score_retrieval(&set(&[1, 2, 3]), &[2, 3, 4, 5]);

        assert_eq!(scores.true_positives, 2);
        assert!((scores.precision - 0.5).abs() < 1e-12);
        assert!((scores.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores.f1 - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn perfect_retrieval() {
        let scores = score_retrieval(&set(&[7]), &[7]);
        assert_eq!((scores.precision, scores.recall, scores.f1), (1.0, 1.0, 1.0));
    }

    #[test]
    fn no_overlap_gives_zero_f1() {
        let scores = score_retrieval(&set(&[1]), &[2, 3]);
        assert_eq!((scores.precision, scores.recall, scores.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn zero_denominators_are_zero_not_nan() {
        let nothing_retrieved = score_retrieval(&set(&[1, 2]), &[]);
        assert_eq!(nothing_retrieved.precision, 0.0);
        assert_eq!(nothing_retrieved.recall, 0.0);

        let nothing_expected = score_retrieval(&set(&[]), &[4]);
        assert_eq!(nothing_expected.recall, 0.0);
        assert_eq!(nothing_expected.precision, 0.0);

        let both_empty = score_retrieval(&set(&[]), &[]);
        assert_eq!((both_empty.precision, both_empty.recall, both_empty.f1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn repeated_retrieved_ids_each_count() {
        assert_eq!(true_positives(&set(&[1]), &[1, 1, 2]), 2);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert_eq!(mean([1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn cosine_rejects_bad_shapes() {
        assert!(matches!(cosine_similarity(&[], &[]), Err(EvalError::SimilarityComputationFailed(_))));
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).is_err());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn cosine_of_known_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap()).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-100.0f32..100.0, 1..32)
            .prop_filter("non-zero", |v| v.iter().any(|x| x.abs() > 1e-3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn cosine_is_bounded(a in arb_vector(), seed in any::<u64>()) {
            // Derive b with the same length as a.
            let b: Vec<f32> = a.iter().enumerate()
                .map(|(i, x)| ((seed.wrapping_add(i as u64) % 17) as f32 - 8.0) + x * 0.5)
                .collect();
            prop_assume!(b.iter().any(|x| *x != 0.0));
            let s = cosine_similarity(&a, &b).unwrap();
            prop_assert!((-1.0..=1.0).contains(&s));
        }

        #[test]
        fn identical_vectors_have_similarity_one(a in arb_vector()) {
            let s = cosine_similarity(&a, &a).unwrap();
            prop_assert!((s - 1.0).abs() < 1e-9);
        }

        #[test]
        fn scores_stay_in_unit_interval(
            expected in proptest::collection::btree_set(0u64..20, 0..10),
            retrieved in proptest::collection::vec(0u64..20, 0..10),
        ) {
            let scores = score_retrieval(&expected, &retrieved);
            for value in [scores.precision, scores.recall, scores.f1] {
                prop_assert!(!value.is_nan());
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
