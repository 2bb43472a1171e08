//! Error types for plantdoc.

/// Result type alias for plantdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for plantdoc.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Data directory could not be determined.
    #[error("could not determine data directory for this platform")]
    DataDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Model not found in configuration.
    #[error("model '{name}' not found in configuration")]
    ModelNotFound {
        /// Name of the missing model.
        name: String,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Image could not be decoded, resized or re-encoded.
    #[error("image processing failed: {reason}")]
    ImageProcessing {
        /// Description of the processing failure.
        reason: String,
    },

    /// Classifier model could not be loaded.
    #[error("classifier model unavailable: {reason}")]
    ModelUnavailable {
        /// Description of the load failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Classifier returned no results.
    #[error("classifier returned no prediction")]
    NoPrediction,

    /// Location services are not authorized.
    #[error("location permission is required")]
    LocationPermission,

    /// Reverse geocoding failed.
    #[error("reverse geocoding failed: {reason}")]
    Geocode {
        /// Description of the lookup failure.
        reason: String,
    },

    /// Persisted collection could not be decoded.
    #[error("failed to decode stored '{key}'")]
    PersistenceDecode {
        /// Storage key of the collection.
        key: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to encode a collection for storage.
    #[error("failed to encode '{key}' for storage")]
    StorageEncode {
        /// Storage key of the collection.
        key: String,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read from storage.
    #[error("failed to read storage file '{path}'")]
    StorageRead {
        /// Path to the storage file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to storage.
    #[error("failed to write storage file '{path}'")]
    StorageWrite {
        /// Path to the storage file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Storage key contains characters that cannot be used in a file name.
    #[error("invalid storage key: {key}")]
    InvalidStorageKey {
        /// The rejected key.
        key: String,
    },

    /// Invalid latitude value.
    #[error("invalid latitude: {value} (must be -90.0 to 90.0)")]
    InvalidLatitude {
        /// Invalid latitude value.
        value: f64,
    },

    /// Invalid longitude value.
    #[error("invalid longitude: {value} (must be -180.0 to 180.0)")]
    InvalidLongitude {
        /// Invalid longitude value.
        value: f64,
    },

    /// The pipeline task has stopped and no longer accepts commands.
    #[error("prediction pipeline is not running")]
    PipelineClosed,

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Human-readable status shown in place of the prediction result.
    pub fn status_message(&self) -> String {
        match self {
            Self::ImageProcessing { .. } => {
                "Image could not be processed. Please try another photo.".to_string()
            }
            Self::ModelUnavailable { .. } => "The ML model could not be loaded.".to_string(),
            Self::Inference { reason } => format!("An error occurred during prediction: {reason}"),
            Self::NoPrediction => "No prediction available. Please try another photo.".to_string(),
            Self::LocationPermission => {
                "Location permission is required. Please enable it in settings.".to_string()
            }
            Self::Geocode { reason } => format!("Could not retrieve location details: {reason}"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_for_pipeline_errors() {
        assert!(
            Error::NoPrediction
                .status_message()
                .starts_with("No prediction")
        );
        assert_eq!(
            Error::ModelUnavailable {
                reason: "missing".into()
            }
            .status_message(),
            "The ML model could not be loaded."
        );
        assert!(
            Error::Inference {
                reason: "shape mismatch".into()
            }
            .status_message()
            .contains("shape mismatch")
        );
    }

    #[test]
    fn test_status_message_falls_back_to_display() {
        let err = Error::ModelNotFound {
            name: "leaf".into(),
        };
        assert_eq!(err.status_message(), err.to_string());
    }
}
