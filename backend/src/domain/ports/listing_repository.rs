//! Port abstraction for listing persistence adapters.

use async_trait::async_trait;

use crate::domain::listing::{Listing, ListingId};
use crate::domain::search::SearchCriteria;
use crate::domain::user::UserId;

/// Persistence errors raised by listing repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingPersistenceError {
    /// Repository connection could not be established.
    #[error("listing repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("listing repository query failed: {message}")]
    Query { message: String },
    /// A stored row could not be mapped back into the domain.
    #[error("stored listing is corrupt: {message}")]
    Corrupt { message: String },
}

impl ListingPersistenceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a new listing row.
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError>;

    /// Fetch a listing by identifier.
    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<Listing>, ListingPersistenceError>;

    /// Overwrite an existing row. Returns `false` when the row is gone.
    async fn update(&self, listing: &Listing) -> Result<bool, ListingPersistenceError>;

    /// Delete a row. Returns `false` when the row was already gone.
    async fn delete(&self, id: &ListingId) -> Result<bool, ListingPersistenceError>;

    /// Return one page of active listings matching the criteria, newest
    /// first, plus the total match count.
    async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Listing>, u64), ListingPersistenceError>;

    /// All listings owned by a user regardless of status, newest first.
    async fn list_owned(&self, owner: &UserId) -> Result<Vec<Listing>, ListingPersistenceError>;
}
