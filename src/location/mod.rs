//! Location services collaborator.

use crate::error::{Error, Result};
use crate::record::{Coordinate, Placemark};

/// Location permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authorization {
    /// The user has not answered the permission prompt.
    #[default]
    NotDetermined,
    /// Location access granted.
    Authorized,
    /// Location access refused or restricted.
    Denied,
}

impl Authorization {
    /// True when location services may be used.
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Supplies the device coordinate and reverse-geocodes map points.
///
/// Calls may block and are issued from worker threads.
pub trait LocationProvider: Send + Sync {
    /// Current permission state.
    fn authorization(&self) -> Authorization;

    /// Last known device coordinate, if any.
    fn current_coordinate(&self) -> Option<Coordinate>;

    /// Resolve a coordinate to candidate placemarks, best match first.
    fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<Placemark>>;
}

/// Provider answering from fixed values.
///
/// Backs the command line, which has no location hardware or network.
#[derive(Debug, Clone, Default)]
pub struct StaticLocationProvider {
    authorization: Authorization,
    coordinate: Option<Coordinate>,
    placemark: Option<Placemark>,
    geocode_failure: Option<String>,
}

impl StaticLocationProvider {
    /// Authorized provider with no coordinate and no placemark.
    pub fn authorized() -> Self {
        Self {
            authorization: Authorization::Authorized,
            ..Self::default()
        }
    }

    /// Provider whose permission was refused.
    pub fn denied() -> Self {
        Self {
            authorization: Authorization::Denied,
            ..Self::default()
        }
    }

    /// Report `coordinate` as the device location.
    #[must_use]
    pub const fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Answer reverse-geocoding requests with `placemark`.
    #[must_use]
    pub fn with_placemark(mut self, placemark: Placemark) -> Self {
        self.placemark = Some(placemark);
        self
    }

    /// Fail reverse-geocoding requests with `reason`.
    #[must_use]
    pub fn with_geocode_failure(mut self, reason: impl Into<String>) -> Self {
        self.geocode_failure = Some(reason.into());
        self
    }
}

impl LocationProvider for StaticLocationProvider {
    fn authorization(&self) -> Authorization {
        self.authorization
    }

    fn current_coordinate(&self) -> Option<Coordinate> {
        if self.authorization.is_authorized() {
            self.coordinate
        } else {
            None
        }
    }

    fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<Vec<Placemark>> {
        if let Some(reason) = &self.geocode_failure {
            return Err(Error::Geocode {
                reason: reason.clone(),
            });
        }
        Ok(self.placemark.iter().cloned().collect())
    }
}
