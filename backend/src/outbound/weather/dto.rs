//! DTOs for decoding OpenWeatherMap current-conditions responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into the
//! domain [`WeatherReading`] in one pass.

use serde::Deserialize;

use crate::domain::weather::WeatherReading;

#[derive(Debug, Deserialize)]
pub(super) struct CurrentConditionsDto {
    pub(super) main: MainDto,
    #[serde(default)]
    pub(super) weather: Vec<ConditionDto>,
    pub(super) wind: Option<WindDto>,
    pub(super) name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MainDto {
    pub(super) temp: f64,
    pub(super) feels_like: f64,
    pub(super) humidity: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConditionDto {
    pub(super) description: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WindDto {
    pub(super) speed: f64,
}

impl CurrentConditionsDto {
    pub(super) fn into_domain_reading(self) -> Result<WeatherReading, String> {
        if !self.main.temp.is_finite() || !self.main.feels_like.is_finite() {
            return Err("temperature fields must be finite".to_owned());
        }
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| "weather array is empty".to_owned())?;
        Ok(WeatherReading {
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            condition,
            wind_speed_mps: self.wind.map_or(0.0, |wind| wind.speed),
            place: self.name.filter(|name| !name.is_empty()),
        })
    }
}
