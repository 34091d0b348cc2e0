//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain services and remain testable without real I/O behind the ports.

use std::sync::Arc;

use crate::domain::{IdentityService, ListingService, WeatherService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub listings: Arc<ListingService>,
    pub identity: Arc<IdentityService>,
    pub weather: Arc<WeatherService>,
}

impl HttpState {
    /// Bundle the domain services handlers dispatch into.
    pub fn new(
        listings: Arc<ListingService>,
        identity: Arc<IdentityService>,
        weather: Arc<WeatherService>,
    ) -> Self {
        Self {
            listings,
            identity,
            weather,
        }
    }
}
