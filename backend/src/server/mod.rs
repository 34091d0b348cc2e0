//! Server construction: adapter selection, service wiring, and the Actix
//! application factory.

pub mod config;

pub use config::{AppConfig, ConfigError, DatabaseConfig, StorageConfig};

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use reqwest::Url;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{ImageStore, ListingRepository, TokenVerifier, UserRepository};
use crate::domain::{IdentityService, ListingService, WeatherService};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::listings::{
    create_listing, delete_listing, get_listing, my_listings, search_listings, update_listing,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{get_profile, update_profile};
use crate::inbound::http::weather::current_weather;
use crate::middleware::RequestLog;
use crate::outbound::identity::JwtVerifier;
use crate::outbound::persistence::{
    PgListingRepository, PgPool, PgUserRepository, SqliteListingRepository, SqlitePool,
    SqliteUserRepository, run_postgres_migrations, run_sqlite_migrations,
};
use crate::outbound::storage::{LocalImageStore, S3ImageStore};
use crate::outbound::weather::WeatherHttpSource;

/// Static-file mount for locally stored uploads: `(url prefix, directory)`.
type StaticMount = Option<(String, String)>;

struct Repositories {
    listings: Arc<dyn ListingRepository>,
    users: Arc<dyn UserRepository>,
}

/// Apply migrations and build the repository family the config selects.
async fn build_repositories(config: &AppConfig) -> std::io::Result<Repositories> {
    match &config.database {
        DatabaseConfig::Postgres { url } => {
            run_postgres_migrations(url)
                .await
                .map_err(std::io::Error::other)?;
            let pool = PgPool::connect(url).await.map_err(std::io::Error::other)?;
            info!(backend = "postgres", "database ready");
            Ok(Repositories {
                listings: Arc::new(PgListingRepository::new(pool.clone())),
                users: Arc::new(PgUserRepository::new(pool)),
            })
        }
        DatabaseConfig::Sqlite { path } => {
            run_sqlite_migrations(path).map_err(std::io::Error::other)?;
            let pool = SqlitePool::connect(path).map_err(std::io::Error::other)?;
            info!(backend = "sqlite", path = %path, "database ready");
            Ok(Repositories {
                listings: Arc::new(SqliteListingRepository::new(pool.clone())),
                users: Arc::new(SqliteUserRepository::new(pool)),
            })
        }
    }
}

/// Build the image store the config selects, plus the static mount the local
/// store needs.
async fn build_image_store(config: &AppConfig) -> (Arc<dyn ImageStore>, StaticMount) {
    match &config.storage {
        StorageConfig::S3 { bucket, region } => {
            info!(bucket = %bucket, region = %region, "using S3 image storage");
            (
                Arc::new(S3ImageStore::from_env(bucket.clone(), region.clone()).await),
                None,
            )
        }
        StorageConfig::Local { dir, public_base } => {
            info!(dir = %dir, "using local image storage");
            (
                Arc::new(LocalImageStore::new(dir.clone(), public_base.clone())),
                Some((public_base.clone(), dir.clone())),
            )
        }
    }
}

fn build_http_state(
    config: &AppConfig,
    repositories: Repositories,
    images: Arc<dyn ImageStore>,
) -> std::io::Result<HttpState> {
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(
        config.auth_signing_key.as_bytes(),
        config.auth_issuer.as_deref(),
    ));
    let weather_endpoint = Url::parse(&config.weather_api_url)
        .map_err(|err| std::io::Error::other(format!("invalid WEATHER_API_URL: {err}")))?;
    let weather_source = WeatherHttpSource::new(weather_endpoint, config.weather_api_key.clone())
        .map_err(|err| std::io::Error::other(format!("weather client: {err}")))?;

    Ok(HttpState::new(
        Arc::new(ListingService::new(repositories.listings, images)),
        Arc::new(IdentityService::new(verifier, repositories.users)),
        Arc::new(WeatherService::new(Arc::new(weather_source))),
    ))
}

/// Assemble the Actix application. Shared between the real server and
/// integration tests, which pass in stub-backed state.
pub fn build_app(
    http_state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
    static_mount: StaticMount,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    // `/listings/mine` must register ahead of `/listings/{id}` so "mine"
    // is not captured as an id.
    let api = web::scope("/api/v1")
        .service(current_weather)
        .service(search_listings)
        .service(my_listings)
        .service(get_listing)
        .service(create_listing)
        .service(update_listing)
        .service(delete_listing)
        .service(get_profile)
        .service(update_profile);

    let app = App::new()
        .app_data(http_state)
        .app_data(health_state)
        .wrap(RequestLog)
        .service(api)
        .service(ready)
        .service(live);

    let app = match static_mount {
        Some((prefix, dir)) => app.service(actix_files::Files::new(&prefix, &dir)),
        None => app,
    };

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Wire everything per the configuration and run the HTTP server until
/// shutdown.
///
/// # Errors
/// Returns an [`std::io::Error`] when startup wiring, binding, or the
/// listener itself fails.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let repositories = build_repositories(&config).await?;
    let (images, static_mount) = build_image_store(&config).await;
    let http_state = web::Data::new(build_http_state(&config, repositories, images)?);
    let health_state = web::Data::new(HealthState::new());

    let bind_addr = (config.host.clone(), config.port);
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(
            http_state.clone(),
            server_health_state.clone(),
            static_mount.clone(),
        )
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    info!(host = %config.host, port = config.port, "server listening");
    server.await
}
