//! Configuration type definitions.

use crate::constants::{
    DEFAULT_MAX_DIMENSION, DEFAULT_MODEL_INPUT_SIZE, DEFAULT_TOP_K, fallback_location,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configured models by name.
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Marked location settings.
    #[serde(default)]
    pub locations: LocationsConfig,
}

/// Configuration for a single classification model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the labels file (one label per line, in output order).
    pub labels: PathBuf,

    /// Square input edge expected by the model.
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Apply softmax to raw model outputs.
    #[serde(default = "default_softmax")]
    pub softmax: bool,
}

fn default_input_size() -> u32 {
    DEFAULT_MODEL_INPUT_SIZE
}

const fn default_softmax() -> bool {
    true
}

/// Default prediction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model name to use.
    pub model: Option<String>,

    /// Largest image edge after normalization.
    pub max_dimension: u32,

    /// Number of ranked labels to request from the classifier.
    pub top_k: usize,

    /// Latitude used when no location is supplied.
    pub latitude: f64,

    /// Longitude used when no location is supplied.
    pub longitude: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
            top_k: DEFAULT_TOP_K,
            latitude: fallback_location::LATITUDE,
            longitude: fallback_location::LONGITUDE,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding persisted collections (platform data dir if unset).
    pub data_dir: Option<PathBuf>,
}

/// Marked location settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsConfig {
    /// Persist marked locations across runs.
    pub persist: bool,
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_config_default_values() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.max_dimension, 1024);
        assert_eq!(defaults.top_k, 5);
        assert_eq!(defaults.latitude, 37.3349);
        assert_eq!(defaults.longitude, -122.00902);
        assert!(defaults.model.is_none());
    }

    #[test]
    fn test_locations_not_persisted_by_default() {
        assert!(!Config::default().locations.persist);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_model_config_field_defaults() {
        let model: ModelConfig = toml::from_str(
            r#"
path = "leaf.onnx"
labels = "labels.txt"
"#,
        )
        .unwrap();
        assert_eq!(model.input_size, 224);
        assert!(model.softmax);
    }
}
