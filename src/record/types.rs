//! Record type definitions.

use crate::constants::{ADDRESS_SEPARATOR, fallback_location};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude (-90.0 to 90.0).
    pub latitude: f64,
    /// Longitude (-180.0 to 180.0).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidLatitude { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidLongitude { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Coordinate used when the device location is unknown.
    pub const fn fallback() -> Self {
        Self {
            latitude: fallback_location::LATITUDE,
            longitude: fallback_location::LONGITUDE,
        }
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::fallback()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A persisted classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique record identifier.
    pub id: Uuid,
    /// Predicted disease label.
    pub label: String,
    /// Top confidence formatted with two decimals (e.g. `0.92`).
    pub confidence: String,
    /// When the prediction was made.
    pub date: DateTime<Utc>,
    /// Latitude at prediction time.
    pub latitude: f64,
    /// Longitude at prediction time.
    pub longitude: f64,
}

impl Prediction {
    /// Location the prediction was recorded at.
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A user-confirmed map point annotated with the prediction shown at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedLocation {
    /// Unique record identifier.
    pub id: Uuid,
    /// Human-readable address.
    pub address: String,
    /// Snapshot of the displayed prediction when the point was marked.
    pub last_prediction_label: String,
}

impl MarkedLocation {
    /// Create a new marked location with a fresh identifier.
    pub fn new(address: impl Into<String>, last_prediction_label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            last_prediction_label: last_prediction_label.into(),
        }
    }
}

/// Reverse-geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placemark {
    /// City or town.
    pub locality: Option<String>,
    /// State, province or region.
    pub administrative_area: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

impl Placemark {
    /// Address formed from the components that are present.
    ///
    /// May be empty when no component is known.
    pub fn address(&self) -> String {
        [&self.locality, &self.administrative_area, &self.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(ADDRESS_SEPARATOR)
    }
}
