//! facematch-core — Face embeddings and same-person verification.
//!
//! Runs a MobileFaceNet-style ONNX model through ONNX Runtime to turn one
//! face image into an embedding, and compares embeddings by cosine similarity.

pub mod config;
pub mod preprocess;
pub mod recognizer;
pub mod similarity;
pub mod types;

#[cfg(test)]
mod onnx_fixture;

pub use config::{Config, DEFAULT_INTRA_THREADS};
pub use preprocess::TensorLayout;
pub use recognizer::{extract_embedding, verify_faces, ExtractError, FaceEmbedder, VerifyError};
pub use similarity::{cosine_similarity, is_same_person, SimilarityError, DEFAULT_SIMILARITY_THRESHOLD};
pub use types::{Embedding, Verification};
