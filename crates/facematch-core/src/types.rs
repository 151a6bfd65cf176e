use crate::similarity::{cosine_similarity, SimilarityError};
use serde::{Deserialize, Serialize};

/// Face embedding vector produced by one forward pass of the model.
///
/// The values are the raw first row of the model output (not re-normalized);
/// cosine similarity is scale-invariant, so no normalization is needed for
/// comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    values: Vec<f32>,
    /// Model that produced this embedding (file stem, e.g. "mobilefacenet").
    model: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>, model: Option<String>) -> Self {
        Self { values, model }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    /// Cosine similarity against another embedding, in [-1, 1].
    pub fn similarity(&self, other: &Embedding) -> Result<f32, SimilarityError> {
        if let (Some(a), Some(b)) = (self.model(), other.model()) {
            if a != b {
                tracing::warn!(left = a, right = b, "comparing embeddings from different models");
            }
        }
        cosine_similarity(&self.values, &other.values)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values, None)
    }
}

/// Outcome of comparing two face images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    /// Cosine similarity of the two embeddings [-1, 1].
    pub similarity: f32,
    /// Threshold the decision was made against.
    pub threshold: f32,
    pub same_person: bool,
}
