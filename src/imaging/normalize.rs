//! Image decoding and size normalization.

use crate::constants::{MAX_DIMENSION_LIMIT, MAX_NORMALIZED_PIXELS};
use crate::error::{Error, Result};
use image::{DynamicImage, imageops::FilterType};
use tracing::debug;

/// Decode an in-memory image (PNG, JPEG, WebP or BMP).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::ImageProcessing {
        reason: format!("decode failed: {e}"),
    })
}

/// Scale factor that fits `width` x `height` into a `max_dimension` box.
///
/// Applied unconditionally, so images smaller than the box are upscaled.
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let max = f64::from(max_dimension);
    (max / f64::from(width)).min(max / f64::from(height))
}

/// Target dimensions after scaling, rounded to whole pixels (at least 1).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(Error::ImageProcessing {
            reason: format!("image has no pixels ({width}x{height})"),
        });
    }
    if max_dimension == 0 || max_dimension > MAX_DIMENSION_LIMIT {
        return Err(Error::ImageProcessing {
            reason: format!(
                "maximum dimension must be between 1 and {MAX_DIMENSION_LIMIT}, got {max_dimension}"
            ),
        });
    }

    let scale = scale_factor(width, height, max_dimension);
    let new_width = (f64::from(width) * scale).round().max(1.0) as u32;
    let new_height = (f64::from(height) * scale).round().max(1.0) as u32;

    let pixels = u64::from(new_width) * u64::from(new_height);
    if pixels > MAX_NORMALIZED_PIXELS {
        return Err(Error::ImageProcessing {
            reason: format!("normalized image too large ({new_width}x{new_height})"),
        });
    }
    Ok((new_width, new_height))
}

/// Rescale an image so its longer edge equals `max_dimension`.
pub fn normalize(image: &DynamicImage, max_dimension: u32) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = scaled_dimensions(width, height, max_dimension)?;

    debug!("Normalizing image {width}x{height} -> {new_width}x{new_height}");

    if (new_width, new_height) == (width, height) {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(new_width, new_height, FilterType::Triangle))
}

/// Decode bytes and normalize in one step.
pub fn normalize_bytes(bytes: &[u8], max_dimension: u32) -> Result<DynamicImage> {
    let decoded = decode_image(bytes)?;
    normalize(&decoded, max_dimension)
}
