//! Adaptive compression of evidence photos to an upload budget.
//!
//! Quality loss is visually cheaper than dimension loss for document photos,
//! so the search exhausts quality reduction before paying for a resize.

use crate::media::model::{EncodedImage, ImageCodec};

/// Byte/dimension budget for one compression run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionBudget {
    pub max_bytes: usize,
    pub max_dimension: u32,
    pub initial_quality: f32,
}

/// Quality floor below which further reduction is not worth the artifacts.
const MIN_QUALITY: f32 = 0.45;
/// Per-attempt quality reduction step.
const QUALITY_STEP: f32 = 0.08;
/// Dimension shrink ratio applied once quality is exhausted.
const DIMENSION_RATIO: f32 = 0.85;
/// Attempt ceiling; past it the best effort is returned rather than failing,
/// so compression alone never blocks a submission.
const MAX_ATTEMPTS: u32 = 10;

/// Compresses `image` until it fits `budget.max_bytes`, or the attempt
/// ceiling is reached.
///
/// The input is returned unchanged when it already fits. The result is never
/// larger than the input; a codec failure falls back to the input unchanged.
pub fn compress_to_budget(
    codec: &dyn ImageCodec,
    image: &EncodedImage,
    budget: &CompressionBudget,
) -> EncodedImage {
    if image.byte_size() <= budget.max_bytes {
        return image.clone();
    }

    let scale = if image.max_dimension() > budget.max_dimension {
        f64::from(budget.max_dimension) / f64::from(image.max_dimension())
    } else {
        1.0
    };
    let mut target_width = scaled_dimension(image.width, scale);
    let mut target_height = scaled_dimension(image.height, scale);

    let mut quality = budget.initial_quality;
    let mut best: Option<EncodedImage> = None;

    for _attempt in 0..MAX_ATTEMPTS {
        let encoded = match codec.encode(image, target_width, target_height, quality) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!("[ImageCompressor] Encode failed, keeping original: {}", err);
                return image.clone();
            }
        };

        let fits = encoded.byte_size() <= budget.max_bytes;
        best = Some(encoded);
        if fits {
            break;
        }

        if quality > MIN_QUALITY + 0.05 {
            quality = (quality - QUALITY_STEP).max(MIN_QUALITY);
        } else {
            target_width = scaled_dimension(target_width, f64::from(DIMENSION_RATIO));
            target_height = scaled_dimension(target_height, f64::from(DIMENSION_RATIO));
            quality = budget.initial_quality;
        }
    }

    match best {
        Some(candidate) if candidate.byte_size() <= image.byte_size() => candidate,
        _ => image.clone(),
    }
}

fn scaled_dimension(value: u32, scale: f64) -> u32 {
    ((f64::from(value) * scale).round() as u32).max(1)
}
