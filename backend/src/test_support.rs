//! In-memory port implementations for integration tests.
//!
//! These adapters honour the same contracts as the Diesel and S3 adapters
//! so HTTP-level tests can exercise full request flows without external
//! services.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::listing::{Listing, ListingId, ListingStatus, Locator};
use crate::domain::ports::{
    ImageStore, ListingPersistenceError, ListingRepository, StorageError, TokenClaims,
    TokenVerificationError, TokenVerifier, UserPersistenceError, UserRepository,
    WeatherSource, WeatherSourceError,
};
use crate::domain::search::SearchCriteria;
use crate::domain::user::{User, UserId, UserProfile};
use crate::domain::weather::{Coordinates, WeatherReading};

/// Listing repository backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryListingRepository {
    rows: Mutex<HashMap<String, Listing>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored listings, any status.
    pub fn len(&self) -> usize {
        self.rows.lock().expect("lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_criteria(listing: &Listing, criteria: &SearchCriteria) -> bool {
    if listing.status != ListingStatus::Active {
        return false;
    }
    if let Some(category) = criteria.category {
        if listing.category != category {
            return false;
        }
    }
    if let Some(listing_type) = criteria.listing_type {
        if listing.listing_type != listing_type {
            return false;
        }
    }
    if let Some(text) = criteria.text() {
        let needle = text.to_lowercase();
        if !listing.title.to_lowercase().contains(&needle)
            && !listing.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        self.rows
            .lock()
            .expect("lock")
            .insert(listing.id.to_string(), listing.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<Listing>, ListingPersistenceError> {
        Ok(self.rows.lock().expect("lock").get(&id.to_string()).cloned())
    }

    async fn update(&self, listing: &Listing) -> Result<bool, ListingPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        let key = listing.id.to_string();
        if !rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(key, listing.clone());
        Ok(true)
    }

    async fn delete(&self, id: &ListingId) -> Result<bool, ListingPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .remove(&id.to_string())
            .is_some())
    }

    async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Listing>, u64), ListingPersistenceError> {
        let rows = self.rows.lock().expect("lock");
        let mut matched: Vec<Listing> = rows
            .values()
            .filter(|listing| matches_criteria(listing, criteria))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as u64;
        let page: Vec<Listing> = matched
            .into_iter()
            .skip(criteria.offset() as usize)
            .take(criteria.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_owned(&self, owner: &UserId) -> Result<Vec<Listing>, ListingPersistenceError> {
        let rows = self.rows.lock().expect("lock");
        let mut owned: Vec<Listing> = rows
            .values()
            .filter(|listing| &listing.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

/// User repository backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        self.rows
            .lock()
            .expect("lock")
            .insert(user.id.to_string(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.rows.lock().expect("lock").get(&id.to_string()).cloned())
    }

    async fn find_by_subject(
        &self,
        subject: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .values()
            .find(|user| user.subject == subject)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        profile: &UserProfile,
    ) -> Result<bool, UserPersistenceError> {
        let mut rows = self.rows.lock().expect("lock");
        match rows.get_mut(&id.to_string()) {
            Some(user) => {
                user.profile = profile.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Image store keeping objects in memory.
#[derive(Default)]
pub struct InMemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object is currently stored under `locator`.
    pub fn contains(&self, locator: &Locator) -> bool {
        self.objects
            .lock()
            .expect("lock")
            .contains_key(locator.as_ref())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("lock").len()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Result<Locator, StorageError> {
        let key = format!("{}_{filename}", uuid::Uuid::new_v4().simple());
        self.objects.lock().expect("lock").insert(key.clone(), bytes);
        Ok(Locator::new(key))
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        self.objects.lock().expect("lock").remove(locator.as_ref());
        Ok(())
    }

    fn public_url(&self, locator: &Locator) -> String {
        format!("/static/uploads/{}", locator.as_ref())
    }
}

/// Token verifier resolving tokens from a fixed map, for tests that do not
/// want to mint real JWTs.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, TokenClaims>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as a valid credential for `subject`.
    pub fn with_token(mut self, token: impl Into<String>, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        self.tokens.insert(
            token.into(),
            TokenClaims {
                subject: subject.clone(),
                name: Some(subject),
                email: None,
            },
        );
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenVerificationError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| TokenVerificationError::invalid("unknown test token"))
    }
}

/// Weather source returning a canned reading or error.
pub struct FixedWeatherSource {
    outcome: Result<WeatherReading, WeatherSourceError>,
}

impl FixedWeatherSource {
    pub fn ok(reading: WeatherReading) -> Self {
        Self {
            outcome: Ok(reading),
        }
    }

    pub fn failing(error: WeatherSourceError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait]
impl WeatherSource for FixedWeatherSource {
    async fn current(
        &self,
        _coordinates: &Coordinates,
    ) -> Result<WeatherReading, WeatherSourceError> {
        self.outcome.clone()
    }
}

/// A reading used across tests that only care about plumbing.
pub fn sample_reading() -> WeatherReading {
    WeatherReading {
        temperature_c: 14.2,
        feels_like_c: 13.0,
        humidity_pct: 72.0,
        condition: "scattered clouds".to_owned(),
        wind_speed_mps: 3.4,
        place: Some("Ludlow".to_owned()),
    }
}
