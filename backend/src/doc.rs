//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification served by Swagger UI in debug
//! builds. Registers every REST endpoint, the shared error schema, and the
//! bearer-token security scheme.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Category, Error, ErrorCode, ListingStatus, ListingType, WeatherReading};
use crate::inbound::http::listings::{ListingPatch, ListingPayload, ListingResponse};
use crate::inbound::http::users::{ProfileRequest, ProfileResponse};

/// Enrich the generated document with the bearer-token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Identity-provider token sent as Authorization: Bearer"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Farmshare backend API",
        description = "Marketplace for sharing farm resources: listings, profiles, and a weather proxy."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::listings::search_listings,
        crate::inbound::http::listings::my_listings,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::update_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::weather::current_weather,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Category,
        ListingType,
        ListingStatus,
        ListingPayload,
        ListingPatch,
        ListingResponse,
        ProfileRequest,
        ProfileResponse,
        WeatherReading,
    )),
    tags(
        (name = "listings", description = "Marketplace listings"),
        (name = "users", description = "Profiles for authenticated users"),
        (name = "weather", description = "Weather proxy"),
        (name = "health", description = "Probes for orchestration")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/listings",
            "/api/v1/listings/mine",
            "/api/v1/listings/{id}",
            "/api/v1/profile",
            "/api/v1/weather",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
