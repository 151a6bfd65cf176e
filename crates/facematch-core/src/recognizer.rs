//! Face embedding extraction via ONNX Runtime.
//!
//! Runs a MobileFaceNet-style model (one 112x112x3 input, one embedding
//! output) on a single image and returns the first output row.

use crate::config::{Config, DEFAULT_INTRA_THREADS};
use crate::preprocess::{self, TensorLayout};
use crate::similarity::{cosine_similarity, is_same_person, SimilarityError};
use crate::types::{Embedding, Verification};
use image::DynamicImage;
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Failure of the two-image verification pipeline.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Similarity(#[from] SimilarityError),
}

/// A loaded embedding model.
///
/// [`extract_embedding`] reloads the model on every call. Hold a
/// `FaceEmbedder` instead when embedding many images with the same model.
pub struct FaceEmbedder {
    session: Session,
    layout: TensorLayout,
    model_tag: Option<String>,
    expected_dim: Option<usize>,
}

impl FaceEmbedder {
    /// Load the embedding model from the given path.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        Self::with_intra_threads(model_path, DEFAULT_INTRA_THREADS)
    }

    /// Load with the model path, thread count and expected dimension from `config`.
    pub fn from_config(config: &Config) -> Result<Self, ExtractError> {
        let mut embedder = Self::with_intra_threads(&config.model_path, config.intra_threads)?;
        embedder.expected_dim = config.expected_dim;
        Ok(embedder)
    }

    /// Load the embedding model, running inference on `intra_threads` threads.
    pub fn with_intra_threads(
        model_path: impl AsRef<Path>,
        intra_threads: usize,
    ) -> Result<Self, ExtractError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(model_load_error(path, "file not found"));
        }

        let session = Session::builder()
            .map_err(|e| model_load_error(path, e))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| model_load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| model_load_error(path, e))?;

        let inputs: Vec<_> = session
            .inputs()
            .iter()
            .map(|i| (i.name().to_string(), tensor_dims(i.dtype())))
            .collect();
        let outputs: Vec<_> = session
            .outputs()
            .iter()
            .map(|o| (o.name().to_string(), tensor_dims(o.dtype())))
            .collect();

        tracing::info!(
            path = %path.display(),
            inputs = ?inputs,
            outputs = ?outputs,
            "loaded embedding model"
        );

        if inputs.len() != 1 || outputs.len() != 1 {
            return Err(ExtractError::ShapeMismatch(format!(
                "model must have exactly one input and one output, got {} and {}",
                inputs.len(),
                outputs.len()
            )));
        }

        let (input_name, input_dims) = &inputs[0];
        let dims = input_dims.as_deref().ok_or_else(|| {
            ExtractError::ShapeMismatch(format!("input '{input_name}' is not a tensor"))
        })?;
        let layout = TensorLayout::from_input_shape(dims).ok_or_else(|| {
            ExtractError::ShapeMismatch(format!(
                "input '{input_name}' has shape {dims:?}, expected [1, 112, 112, 3] or [1, 3, 112, 112]"
            ))
        })?;
        if outputs[0].1.is_none() {
            return Err(ExtractError::ShapeMismatch(format!(
                "output '{}' is not a tensor",
                outputs[0].0
            )));
        }
        tracing::debug!(?layout, "embedding model input layout");

        Ok(Self {
            session,
            layout,
            model_tag: path.file_stem().map(|s| s.to_string_lossy().into_owned()),
            expected_dim: None,
        })
    }

    /// Reject embeddings whose length differs from `dim`.
    pub fn with_expected_dim(mut self, dim: usize) -> Self {
        self.expected_dim = Some(dim);
        self
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Extract an embedding from a decoded image.
    pub fn embed(&mut self, image: &DynamicImage) -> Result<Embedding, ExtractError> {
        let input = preprocess::preprocess(image, self.layout);

        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| ExtractError::Inference(format!("input binding: {e}")))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ExtractError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ExtractError::Inference(format!("embedding extraction: {e}")))?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        let values = first_row(&dims, data)?;

        if let Some(expected) = self.expected_dim {
            if values.len() != expected {
                return Err(ExtractError::ShapeMismatch(format!(
                    "expected {expected}-dim embedding, got {}",
                    values.len()
                )));
            }
        }

        tracing::debug!(dim = values.len(), "extracted embedding");

        Ok(Embedding::new(values, self.model_tag.clone()))
    }

    /// Decode the image at `image_path` and extract its embedding.
    pub fn embed_path(&mut self, image_path: impl AsRef<Path>) -> Result<Embedding, ExtractError> {
        let image_path = image_path.as_ref();
        let image = preprocess::load_image(image_path)?;
        tracing::debug!(
            path = %image_path.display(),
            width = image.width(),
            height = image.height(),
            "decoded image"
        );
        self.embed(&image)
    }

    /// Embed two images with this model and decide whether they show the same person.
    pub fn compare(
        &mut self,
        image_a: impl AsRef<Path>,
        image_b: impl AsRef<Path>,
        threshold: f32,
    ) -> Result<Verification, VerifyError> {
        let a = self.embed_path(image_a)?;
        let b = self.embed_path(image_b)?;
        let similarity = cosine_similarity(a.as_slice(), b.as_slice())?;
        let same_person = is_same_person(similarity, threshold);

        tracing::info!(similarity, threshold, same_person, "faces compared");

        Ok(Verification {
            similarity,
            threshold,
            same_person,
        })
    }
}

/// Extract the embedding of one image, loading the model fresh for this call.
pub fn extract_embedding(
    image_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
) -> Result<Embedding, ExtractError> {
    FaceEmbedder::load(model_path)?.embed_path(image_path)
}

/// Compare two face images, loading the model fresh for this call.
pub fn verify_faces(
    image_a: impl AsRef<Path>,
    image_b: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    threshold: f32,
) -> Result<Verification, VerifyError> {
    FaceEmbedder::load(model_path)?.compare(image_a, image_b, threshold)
}

fn model_load_error(path: &Path, reason: impl Display) -> ExtractError {
    ExtractError::ModelLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn tensor_dims(value_type: &ValueType) -> Option<Vec<i64>> {
    match value_type {
        ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
        _ => None,
    }
}

/// Take row 0 of a `[1, D]` (or `[D]`) output tensor.
fn first_row(dims: &[i64], data: &[f32]) -> Result<Vec<f32>, ExtractError> {
    let dim = match dims {
        [1, d] | [d] if *d > 0 => *d as usize,
        _ => {
            return Err(ExtractError::ShapeMismatch(format!(
                "expected embedding output of shape [1, D], got {dims:?}"
            )))
        }
    };
    if data.len() < dim {
        return Err(ExtractError::ShapeMismatch(format!(
            "output shape {dims:?} but only {} values",
            data.len()
        )));
    }
    Ok(data[..dim].to_vec())
}
