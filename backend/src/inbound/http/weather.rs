//! Weather proxy HTTP handler.
//!
//! ```text
//! GET /api/v1/weather?lat=..&lon=..
//! ```

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Error, WeatherReading};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Query parameters for the weather lookup.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Current conditions for a coordinate pair.
#[utoipa::path(
    get,
    path = "/api/v1/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Current conditions", body = WeatherReading),
        (status = 400, description = "Coordinates out of range", body = Error),
        (status = 502, description = "Weather provider unavailable", body = Error)
    ),
    tags = ["weather"],
    operation_id = "getCurrentWeather"
)]
#[get("/weather")]
pub async fn current_weather(
    state: web::Data<HttpState>,
    query: web::Query<WeatherQuery>,
) -> ApiResult<HttpResponse> {
    let reading = state.weather.current(query.lat, query.lon).await?;
    Ok(HttpResponse::Ok().json(reading))
}
