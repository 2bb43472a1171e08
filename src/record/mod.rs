//! Prediction and location records.

mod builder;
mod types;

pub use builder::{build_prediction, display_text, format_confidence};
pub use types::{Coordinate, MarkedLocation, Placemark, Prediction};
