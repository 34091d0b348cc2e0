//! Driven ports: traits the domain depends on, implemented by outbound
//! adapters (persistence, storage, identity provider, weather provider).

pub mod image_store;
pub mod listing_repository;
pub mod token_verifier;
pub mod user_repository;
pub mod weather_source;

pub use image_store::{ImageStore, StorageError};
pub use listing_repository::{ListingPersistenceError, ListingRepository};
pub use token_verifier::{TokenClaims, TokenVerificationError, TokenVerifier};
pub use user_repository::{UserPersistenceError, UserRepository};
pub use weather_source::{WeatherSource, WeatherSourceError};
