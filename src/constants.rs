//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "plantdoc";

/// Largest edge, in pixels, of an image handed to the classifier.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Upper bound accepted for the maximum dimension setting.
pub const MAX_DIMENSION_LIMIT: u32 = 8192;

/// Most pixels a normalized image may hold.
pub const MAX_NORMALIZED_PIXELS: u64 = 8192 * 8192;

/// Default number of ranked labels returned by the classifier.
pub const DEFAULT_TOP_K: usize = 5;

/// Default square input edge for ONNX models.
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 224;

/// Text displayed before any prediction has been made.
pub const INITIAL_DISPLAY_TEXT: &str = "No prediction yet.";

/// Storage keys for persisted collections.
pub mod storage_keys {
    /// Prediction history.
    pub const PREDICTIONS: &str = "Predictions";
    /// Marked locations.
    pub const MARKED_LOCATIONS: &str = "MarkedLocations";
}

/// File extension used by the file-backed key-value store.
pub const STORAGE_FILE_EXTENSION: &str = "json";

/// Coordinate used when the current location is unknown.
pub mod fallback_location {
    /// Fallback latitude.
    pub const LATITUDE: f64 = 37.3349;
    /// Fallback longitude.
    pub const LONGITUDE: f64 = -122.00902;
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places stored in a prediction record.
    pub const DECIMAL_PLACES: usize = 2;
}

/// Separator between address components of a placemark.
pub const ADDRESS_SEPARATOR: &str = ", ";

/// Capacity of the store change notification channels.
pub const NOTIFY_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the pipeline command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Label reported by the classifier used for `--dry-run`.
pub const DRY_RUN_LABEL: &str = "Healthy";
