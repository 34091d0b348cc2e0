//! Weather provider adapter.

mod dto;
pub mod http_source;

pub use http_source::WeatherHttpSource;
