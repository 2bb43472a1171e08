//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::constants::MAX_DIMENSION_LIMIT;
use crate::error::{Error, Result};
use crate::record::Coordinate;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    for (name, model) in &config.models {
        validate_model_shape(name, model)?;
    }
    Ok(())
}

/// Validate default settings.
fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    if defaults.max_dimension == 0 || defaults.max_dimension > MAX_DIMENSION_LIMIT {
        return Err(Error::ConfigValidation {
            message: format!(
                "max_dimension must be between 1 and {MAX_DIMENSION_LIMIT}, got {}",
                defaults.max_dimension
            ),
        });
    }

    if defaults.top_k == 0 {
        return Err(Error::ConfigValidation {
            message: "top_k must be at least 1".to_string(),
        });
    }

    Coordinate::new(defaults.latitude, defaults.longitude)?;

    if let Some(ref model_name) = defaults.model
        && !config.models.contains_key(model_name)
    {
        return Err(Error::ModelNotFound {
            name: model_name.clone(),
        });
    }

    Ok(())
}

fn validate_model_shape(name: &str, model: &ModelConfig) -> Result<()> {
    if model.input_size == 0 {
        return Err(Error::ConfigValidation {
            message: format!("model '{name}': input_size must be at least 1"),
        });
    }
    Ok(())
}

/// Get a model by name from the config.
pub fn get_model<'a>(config: &'a Config, name: &str) -> Result<&'a ModelConfig> {
    config.models.get(name).ok_or_else(|| Error::ModelNotFound {
        name: name.to_string(),
    })
}
