//! Plain-text rendering of predictions and marked locations.

use crate::record::{MarkedLocation, Prediction};

/// One history line: date, label, confidence and coordinate.
pub fn format_prediction(prediction: &Prediction) -> String {
    format!(
        "{}  {}  {}  ({})",
        prediction.date.format("%Y-%m-%d %H:%M:%S"),
        prediction.label,
        prediction.confidence,
        prediction.coordinate()
    )
}

/// One marked location line; the stored result text is flattened to one line.
pub fn format_location(location: &MarkedLocation) -> String {
    format!(
        "{}  [{}]",
        location.address,
        one_line(&location.last_prediction_label)
    )
}

/// Join a multi-line display text with `", "`.
pub fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_format_prediction() {
        let prediction = Prediction {
            id: Uuid::nil(),
            label: "Tomato Early Blight".into(),
            confidence: "0.87".into(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            latitude: 37.3349,
            longitude: -122.00902,
        };
        let line = format_prediction(&prediction);
        assert!(line.starts_with("2024-05-01 09:30:00  Tomato Early Blight  0.87"));
        assert!(line.contains("37.3349"));
    }

    #[test]
    fn test_format_location_flattens_label() {
        let location = MarkedLocation::new("Konya, Türkiye", "Prediction: Rust\nConfidence: %64");
        assert_eq!(
            format_location(&location),
            "Konya, Türkiye  [Prediction: Rust, Confidence: %64]"
        );
    }
}
