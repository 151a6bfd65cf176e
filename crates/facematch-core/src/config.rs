use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use std::path::PathBuf;

const DEFAULT_MODEL_PATH: &str = "models/mobilefacenet.onnx";

/// ONNX Runtime intra-op threads used when none are configured.
pub const DEFAULT_INTRA_THREADS: usize = 2;

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the ONNX embedding model.
    pub model_path: PathBuf,
    /// Cosine similarity above which two faces are the same person.
    pub similarity_threshold: f32,
    /// ONNX Runtime intra-op thread count.
    pub intra_threads: usize,
    /// Embedding length the model must produce, if known.
    pub expected_dim: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            intra_threads: DEFAULT_INTRA_THREADS,
            expected_dim: None,
        }
    }
}

impl Config {
    /// Load configuration from `FACEMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let similarity_threshold = parse_or(
            lookup("FACEMATCH_SIMILARITY_THRESHOLD"),
            defaults.similarity_threshold,
        );
        if !(-1.0..=1.0).contains(&similarity_threshold) {
            tracing::warn!(
                similarity_threshold,
                "similarity threshold outside [-1, 1]; every pair will get the same verdict"
            );
        }

        Self {
            model_path: lookup("FACEMATCH_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            similarity_threshold,
            intra_threads: parse_or(lookup("FACEMATCH_INTRA_THREADS"), defaults.intra_threads),
            expected_dim: lookup("FACEMATCH_EMBEDDING_DIM").and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
