//! Shared harness for HTTP integration tests.
//!
//! Builds the real Actix application over in-memory adapters so tests can
//! drive full request flows without a database, object store, or identity
//! provider.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::web;

use farmshare_backend::domain::{IdentityService, ListingService, WeatherService};
use farmshare_backend::inbound::http::health::HealthState;
use farmshare_backend::inbound::http::state::HttpState;
use farmshare_backend::test_support::{
    FixedWeatherSource, InMemoryImageStore, InMemoryListingRepository, InMemoryUserRepository,
    StaticTokenVerifier, sample_reading,
};

/// Bearer token the harness accepts for the user "auth0|ada".
pub const ADA_TOKEN: &str = "token-ada";
/// Bearer token the harness accepts for the user "auth0|bob".
pub const BOB_TOKEN: &str = "token-bob";

/// Everything a test needs: the wired HTTP state plus handles on the
/// in-memory adapters for assertions.
pub struct TestContext {
    pub listings: Arc<InMemoryListingRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub images: Arc<InMemoryImageStore>,
    pub http_state: web::Data<HttpState>,
    pub health_state: web::Data<HealthState>,
}

/// Harness with a weather source that always succeeds.
pub fn context() -> TestContext {
    context_with_weather(FixedWeatherSource::ok(sample_reading()))
}

/// Harness with an explicit weather source outcome.
pub fn context_with_weather(weather_source: FixedWeatherSource) -> TestContext {
    let listings = Arc::new(InMemoryListingRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let images = Arc::new(InMemoryImageStore::new());
    let verifier = Arc::new(
        StaticTokenVerifier::new()
            .with_token(ADA_TOKEN, "auth0|ada")
            .with_token(BOB_TOKEN, "auth0|bob"),
    );

    let http_state = web::Data::new(HttpState::new(
        Arc::new(ListingService::new(listings.clone(), images.clone())),
        Arc::new(IdentityService::new(verifier, users.clone())),
        Arc::new(WeatherService::new(Arc::new(weather_source))),
    ));

    TestContext {
        listings,
        users,
        images,
        http_state,
        health_state: web::Data::new(HealthState::new()),
    }
}

/// Attach a bearer token to a request under construction.
pub fn authed(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

/// JSON body for a valid rent listing.
pub fn rent_listing_json(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": format!("{title}, good condition"),
        "category": "equipment",
        "listingType": "rent",
        "price": 25.0
    })
}

/// Assemble a multipart body with a JSON `listing` part and a PNG `image`
/// part, returning `(content type, body)`.
pub fn multipart_listing(listing: &serde_json::Value, filename: &str) -> (String, Vec<u8>) {
    let boundary = "farmshare-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"listing\"\r\n\
             Content-Type: application/json\r\n\r\n{listing}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"\x89PNG fake image bytes");
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}
