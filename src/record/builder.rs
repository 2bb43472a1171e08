//! Prediction record construction.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::inference::Classification;
use crate::record::{Coordinate, Prediction};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Build an immutable prediction record from the top classification.
pub fn build_prediction(
    top: &Classification,
    date: DateTime<Utc>,
    coordinate: Option<Coordinate>,
) -> Prediction {
    let coordinate = coordinate.unwrap_or_default();
    Prediction {
        id: Uuid::new_v4(),
        label: top.label.clone(),
        confidence: format_confidence(top.confidence),
        date,
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
    }
}

/// Format a confidence score the way it is stored in a record.
pub fn format_confidence(confidence: f32) -> String {
    format!("{confidence:.prec$}", prec = DECIMAL_PLACES)
}

/// Result text shown to the user after a successful classification.
///
/// The percentage is truncated, not rounded.
#[allow(clippy::cast_possible_truncation)]
pub fn display_text(top: &Classification) -> String {
    let percent = (top.confidence * 100.0) as i32;
    format!("Prediction: {}\nConfidence: %{percent}", top.label)
}
