//! Weather lookup domain types and the proxy service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::Error;
use super::ports::{WeatherSource, WeatherSourceError};

/// Validated WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// Validation failures for coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatesError {
    #[error("latitude must be within [-90, 90], got {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be within [-180, 180], got {0}")]
    LongitudeOutOfRange(f64),
}

impl Coordinates {
    /// Validate and construct coordinates.
    ///
    /// # Errors
    /// Returns a [`CoordinatesError`] when either component is non-finite or
    /// outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude)) {
            return Err(CoordinatesError::LatitudeOutOfRange(latitude));
        }
        if !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude)) {
            return Err(CoordinatesError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Normalised current-conditions reading returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Perceived temperature in degrees Celsius.
    pub feels_like_c: f64,
    /// Relative humidity percentage.
    pub humidity_pct: f64,
    /// Short human-readable condition, e.g. "light rain".
    pub condition: String,
    /// Wind speed in metres per second.
    pub wind_speed_mps: f64,
    /// Place name resolved by the provider, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

/// Weather proxy: validates coordinates, then asks the configured source.
///
/// Each call is a fresh upstream request; no caching layer sits in front.
#[derive(Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
}

impl WeatherService {
    /// Create a service over the given upstream source.
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    /// Fetch current conditions for a coordinate pair.
    ///
    /// # Errors
    /// `InvalidRequest` for out-of-range coordinates; `UpstreamUnavailable`
    /// when the provider is unreachable or erroring.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, Error> {
        let coordinates = Coordinates::new(latitude, longitude)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.source
            .current(&coordinates)
            .await
            .map_err(map_source_error)
    }
}

fn map_source_error(error: WeatherSourceError) -> Error {
    match error {
        WeatherSourceError::Transport { message }
        | WeatherSourceError::Timeout { message }
        | WeatherSourceError::Status { message, .. }
        | WeatherSourceError::Decode { message } => Error::upstream(message),
    }
}
