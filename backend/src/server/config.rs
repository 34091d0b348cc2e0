//! Application configuration loaded from the environment.
//!
//! All wiring decisions are made here once at startup: which database
//! backend to use, where images go, and how to reach the weather provider.
//! Nothing else in the crate reads environment variables.

use std::collections::HashMap;

const DEFAULT_SQLITE_PATH: &str = "farmshare.db";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const DEFAULT_UPLOAD_PUBLIC_BASE: &str = "/static/uploads";
const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Which database backs the repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// Managed PostgreSQL; selected when `DATABASE_URL` is set.
    Postgres { url: String },
    /// Local SQLite file; the fallback for single-node deployments.
    Sqlite { path: String },
}

/// Which store holds listing images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// AWS S3; selected when `S3_BUCKET` and `AWS_REGION` are both set.
    S3 { bucket: String, region: String },
    /// Local uploads directory served as static files.
    Local { dir: String, public_base: String },
}

/// Startup configuration for the whole application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub weather_api_url: String,
    pub weather_api_key: String,
    pub auth_signing_key: String,
    pub auth_issuer: Option<String>,
    pub host: String,
    pub port: u16,
}

/// Configuration failures reported before the server starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value: {message}")]
    Invalid { name: &'static str, message: String },
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] naming the first missing or malformed
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map. Tests use this to
    /// avoid touching the process environment.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] naming the first missing or malformed
    /// variable.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(String::as_str).filter(|v| !v.is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseConfig::Postgres {
                url: url.to_owned(),
            },
            None => DatabaseConfig::Sqlite {
                path: get("SQLITE_PATH").unwrap_or(DEFAULT_SQLITE_PATH).to_owned(),
            },
        };

        let storage = match (get("S3_BUCKET"), get("AWS_REGION")) {
            (Some(bucket), Some(region)) => StorageConfig::S3 {
                bucket: bucket.to_owned(),
                region: region.to_owned(),
            },
            (Some(_), None) => {
                return Err(ConfigError::Invalid {
                    name: "AWS_REGION",
                    message: "required when S3_BUCKET is set".to_owned(),
                });
            }
            _ => StorageConfig::Local {
                dir: get("UPLOAD_DIR").unwrap_or(DEFAULT_UPLOAD_DIR).to_owned(),
                public_base: get("UPLOAD_PUBLIC_BASE")
                    .unwrap_or(DEFAULT_UPLOAD_PUBLIC_BASE)
                    .to_owned(),
            },
        };

        let weather_api_key = get("WEATHER_API_KEY")
            .ok_or(ConfigError::Missing("WEATHER_API_KEY"))?
            .to_owned();
        let auth_signing_key = get("AUTH_SIGNING_KEY")
            .ok_or(ConfigError::Missing("AUTH_SIGNING_KEY"))?
            .to_owned();

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                message: format!("not a port number: {raw}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database,
            storage,
            weather_api_url: get("WEATHER_API_URL")
                .unwrap_or(DEFAULT_WEATHER_API_URL)
                .to_owned(),
            weather_api_key,
            auth_signing_key,
            auth_issuer: get("AUTH_ISSUER").map(ToOwned::to_owned),
            host: get("HOST").unwrap_or(DEFAULT_HOST).to_owned(),
            port,
        })
    }
}
