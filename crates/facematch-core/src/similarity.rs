//! Cosine similarity between embedding vectors and the same-person decision.

use thiserror::Error;

/// Threshold above which two faces are treated as the same person.
///
/// Values between 0.5 and 0.7 are typical for MobileFaceNet-class models;
/// tighten it to reduce false accepts, loosen it to reduce false rejects.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("embedding length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("degenerate vector: cosine similarity is undefined for empty or zero vectors")]
    DegenerateVector,
    #[error("vector contains a non-finite component")]
    NonFinite,
}

/// Compute the cosine similarity `dot(a, b) / (‖a‖ · ‖b‖)`.
///
/// Accumulates in f64 and clamps the result to [-1, 1] so rounding never
/// pushes a self-comparison past 1.0. Never returns NaN: mismatched lengths,
/// zero vectors and non-finite inputs are reported as errors instead.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::DegenerateVector);
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        if !x.is_finite() || !y.is_finite() {
            return Err(SimilarityError::NonFinite);
        }
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Err(SimilarityError::DegenerateVector);
    }

    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// Decide whether a similarity score indicates the same person.
///
/// Strictly greater than: a score equal to the threshold is a rejection.
pub fn is_same_person(score: f32, threshold: f32) -> bool {
    score > threshold
}
