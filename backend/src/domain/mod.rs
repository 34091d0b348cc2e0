//! Domain entities, services, and ports.
//!
//! Everything in this module is transport and storage agnostic. Inbound
//! adapters translate HTTP into these types; outbound adapters implement the
//! traits under [`ports`].

pub mod error;
pub mod identity;
pub mod listing;
pub mod listing_service;
pub mod ports;
pub mod search;
pub mod user;
pub mod weather;

pub use self::error::{Error, ErrorCode};
pub use self::identity::IdentityService;
pub use self::listing::{
    Category, ImageUpload, Listing, ListingChanges, ListingDraft, ListingId, ListingStatus,
    ListingType, Locator,
};
pub use self::listing_service::ListingService;
pub use self::search::{Page, SearchCriteria};
pub use self::user::{User, UserId, UserProfile};
pub use self::weather::{Coordinates, WeatherReading, WeatherService};

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
