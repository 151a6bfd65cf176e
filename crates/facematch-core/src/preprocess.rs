//! Image decoding and tensor preprocessing for the embedding model.
//!
//! The pipeline is fixed: decode → RGB → bilinear resize to 112×112 →
//! `(v - 127.5) / 128.0` → batch dimension of 1.

use crate::recognizer::ExtractError;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::Array4;
use std::path::Path;

// --- Named constants (MobileFaceNet normalization) ---
pub const INPUT_SIZE: usize = 112;
pub const CHANNELS: usize = 3;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_STD: f32 = 128.0; // NOT 127.5, so the range is slightly inside [-1, 1]

/// Memory order of the model's input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 112, 112, 3]`, channels last.
    Nhwc,
    /// `[1, 3, 112, 112]`, channels first.
    Nchw,
}

impl TensorLayout {
    pub fn shape(self) -> (usize, usize, usize, usize) {
        match self {
            TensorLayout::Nhwc => (1, INPUT_SIZE, INPUT_SIZE, CHANNELS),
            TensorLayout::Nchw => (1, CHANNELS, INPUT_SIZE, INPUT_SIZE),
        }
    }

    /// Match a model input shape against the supported layouts.
    ///
    /// Negative dimensions are dynamic and match any expected size.
    pub fn from_input_shape(dims: &[i64]) -> Option<Self> {
        fn fits(dim: i64, expected: usize) -> bool {
            dim < 0 || dim == expected as i64
        }

        if dims.len() != 4 || !fits(dims[0], 1) {
            return None;
        }
        let size = INPUT_SIZE;
        if fits(dims[1], size) && fits(dims[2], size) && fits(dims[3], CHANNELS) {
            Some(TensorLayout::Nhwc)
        } else if fits(dims[1], CHANNELS) && fits(dims[2], size) && fits(dims[3], size) {
            Some(TensorLayout::Nchw)
        } else {
            None
        }
    }
}

/// Decode an image file from disk.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, ExtractError> {
    let path = path.as_ref();
    image::open(path).map_err(|source| ExtractError::ImageDecode {
        path: path.display().to_string(),
        source,
    })
}

/// Map one 8-bit channel value into the model's input range.
pub fn normalize_pixel(value: u8) -> f32 {
    (f32::from(value) - PIXEL_MEAN) / PIXEL_STD
}

/// Convert an image of any size into the model's batch-of-one input tensor.
pub fn preprocess(image: &DynamicImage, layout: TensorLayout) -> Array4<f32> {
    // `image` decodes to RGB order already; grayscale is expanded, alpha dropped.
    let rgb = image.to_rgb8();
    let size = INPUT_SIZE as u32;
    let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros(layout.shape());
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..CHANNELS {
            let value = normalize_pixel(pixel[c]);
            match layout {
                TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
            }
        }
    }

    tensor
}
