//! Reqwest-backed weather source adapter.
//!
//! Owns transport details only: query construction with the provider API
//! key, timeout and HTTP error mapping, and JSON decoding into the domain
//! reading.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::CurrentConditionsDto;
use crate::domain::ports::{WeatherSource, WeatherSourceError};
use crate::domain::weather::{Coordinates, WeatherReading};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Weather source adapter performing GET requests against one endpoint.
pub struct WeatherHttpSource {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl WeatherHttpSource {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(endpoint, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherHttpSource {
    async fn current(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherReading, WeatherSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("lat", coordinates.latitude().to_string()),
                ("lon", coordinates.longitude().to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_owned()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_reading(body.as_ref())
    }
}

fn parse_reading(body: &[u8]) -> Result<WeatherReading, WeatherSourceError> {
    let decoded: CurrentConditionsDto = serde_json::from_slice(body).map_err(|error| {
        WeatherSourceError::decode(format!("invalid weather JSON payload: {error}"))
    })?;
    decoded
        .into_domain_reading()
        .map_err(WeatherSourceError::decode)
}

fn map_transport_error(error: reqwest::Error) -> WeatherSourceError {
    if error.is_timeout() {
        WeatherSourceError::timeout(error.to_string())
    } else {
        WeatherSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> WeatherSourceError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        preview
    };

    // Coordinates are validated before the call, so even a provider 400 is
    // an upstream fault rather than something the caller can correct.
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            WeatherSourceError::timeout(message)
        }
        _ => WeatherSourceError::status(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
