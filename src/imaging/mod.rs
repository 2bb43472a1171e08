//! Image preparation for classification.

mod normalize;

pub use normalize::{decode_image, normalize, normalize_bytes, scale_factor, scaled_dimensions};
