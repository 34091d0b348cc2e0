//! SQLite-backed `ListingRepository` adapter.
//!
//! SQLite has no async Diesel driver, so every call checks out a pooled
//! connection inside `spawn_blocking` and runs the synchronous query there.

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use crate::domain::listing::{Listing, ListingId, ListingStatus};
use crate::domain::ports::{ListingPersistenceError, ListingRepository};
use crate::domain::search::SearchCriteria;
use crate::domain::user::UserId;

use super::lower;
use super::models::ListingRow;
use super::pg_listing_repository::like_pattern;
use super::pool::{PoolError, SqlitePool};
use super::schema::listings;

/// Synchronous Diesel implementation of the [`ListingRepository`] port.
#[derive(Clone)]
pub struct SqliteListingRepository {
    pool: SqlitePool,
}

impl SqliteListingRepository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run `operation` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, operation: F) -> Result<T, ListingPersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, ListingPersistenceError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(map_pool_error)?;
            operation(&mut conn)
        })
        .await
        .map_err(|err| ListingPersistenceError::query(format!("blocking task failed: {err}")))?
    }
}

fn map_pool_error(error: PoolError) -> ListingPersistenceError {
    ListingPersistenceError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> ListingPersistenceError {
    debug!(error = %error, "listing query failed");
    ListingPersistenceError::query(error.to_string())
}

fn map_row(row: ListingRow) -> Result<Listing, ListingPersistenceError> {
    Listing::try_from(row).map_err(ListingPersistenceError::corrupt)
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let row = ListingRow::from(listing);
        self.with_conn(move |conn| {
            diesel::insert_into(listings::table)
                .values(row)
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<Listing>, ListingPersistenceError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = listings::table
                .find(id)
                .select(ListingRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(map_row).transpose()
        })
        .await
    }

    async fn update(&self, listing: &Listing) -> Result<bool, ListingPersistenceError> {
        let row = ListingRow::from(listing);
        let id = listing.id.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(listings::table.find(id))
                .set(row)
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(affected > 0)
        })
        .await
    }

    async fn delete(&self, id: &ListingId) -> Result<bool, ListingPersistenceError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::delete(listings::table.find(id))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(affected > 0)
        })
        .await
    }

    async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Listing>, u64), ListingPersistenceError> {
        let criteria = criteria.clone();
        self.with_conn(move |conn| {
            let mut query = listings::table
                .into_boxed()
                .filter(listings::status.eq(ListingStatus::Active.as_str()));
            let mut count_query = listings::table
                .into_boxed()
                .filter(listings::status.eq(ListingStatus::Active.as_str()));

            if let Some(category) = criteria.category {
                query = query.filter(listings::category.eq(category.as_str()));
                count_query = count_query.filter(listings::category.eq(category.as_str()));
            }
            if let Some(listing_type) = criteria.listing_type {
                query = query.filter(listings::listing_type.eq(listing_type.as_str()));
                count_query =
                    count_query.filter(listings::listing_type.eq(listing_type.as_str()));
            }
            if let Some(text) = criteria.text() {
                let pattern = like_pattern(text);
                query = query.filter(
                    lower(listings::title)
                        .like(pattern.clone())
                        .or(lower(listings::description).like(pattern.clone())),
                );
                count_query = count_query.filter(
                    lower(listings::title)
                        .like(pattern.clone())
                        .or(lower(listings::description).like(pattern)),
                );
            }

            let total: i64 = count_query
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;

            let rows: Vec<ListingRow> = query
                .order(listings::created_at.desc())
                .limit(criteria.limit())
                .offset(criteria.offset())
                .select(ListingRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;

            let items = rows
                .into_iter()
                .map(map_row)
                .collect::<Result<Vec<_>, _>>()?;
            Ok((items, total.max(0) as u64))
        })
        .await
    }

    async fn list_owned(&self, owner: &UserId) -> Result<Vec<Listing>, ListingPersistenceError> {
        let owner = owner.to_string();
        self.with_conn(move |conn| {
            let rows: Vec<ListingRow> = listings::table
                .filter(listings::owner_id.eq(owner))
                .order(listings::created_at.desc())
                .select(ListingRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(map_row).collect()
        })
        .await
    }
}
