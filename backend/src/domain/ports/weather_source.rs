//! Port abstraction for the external weather provider.

use async_trait::async_trait;

use crate::domain::weather::{Coordinates, WeatherReading};

/// Failures raised by weather source adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherSourceError {
    /// The provider could not be reached.
    #[error("weather provider unreachable: {message}")]
    Transport { message: String },
    /// The provider did not answer within the configured timeout.
    #[error("weather provider timed out: {message}")]
    Timeout { message: String },
    /// The provider answered with a non-success status.
    #[error("weather provider returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The provider's payload could not be decoded.
    #[error("weather payload invalid: {message}")]
    Decode { message: String },
}

impl WeatherSourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch current conditions for validated coordinates.
    async fn current(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherReading, WeatherSourceError>;
}
