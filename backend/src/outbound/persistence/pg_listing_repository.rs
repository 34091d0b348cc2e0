//! PostgreSQL-backed `ListingRepository` adapter using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::listing::{Listing, ListingId, ListingStatus};
use crate::domain::ports::{ListingPersistenceError, ListingRepository};
use crate::domain::search::SearchCriteria;
use crate::domain::user::UserId;

use super::lower;
use super::models::ListingRow;
use super::pool::{PgPool, PoolError};
use super::schema::listings;

/// Diesel-async implementation of the [`ListingRepository`] port.
#[derive(Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ListingPersistenceError {
    ListingPersistenceError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> ListingPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    debug!(error = %error, "listing query failed");
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ListingPersistenceError::connection("database connection error")
        }
        other => ListingPersistenceError::query(other.to_string()),
    }
}

fn map_row(row: ListingRow) -> Result<Listing, ListingPersistenceError> {
    Listing::try_from(row).map_err(ListingPersistenceError::corrupt)
}

/// SQL `LIKE` pattern for a case-insensitive substring match.
pub(super) fn like_pattern(text: &str) -> String {
    format!("%{}%", text.to_lowercase())
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(listings::table)
            .values(ListingRow::from(listing))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ListingId,
    ) -> Result<Option<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = listings::table
            .find(id.to_string())
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(map_row).transpose()
    }

    async fn update(&self, listing: &Listing) -> Result<bool, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(listings::table.find(listing.id.to_string()))
            .set(ListingRow::from(listing))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn delete(&self, id: &ListingId) -> Result<bool, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(listings::table.find(id.to_string()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Listing>, u64), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

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
            count_query = count_query.filter(listings::listing_type.eq(listing_type.as_str()));
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
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<ListingRow> = query
            .order(listings::created_at.desc())
            .limit(criteria.limit())
            .offset(criteria.offset())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = rows
            .into_iter()
            .map(map_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, total.max(0) as u64))
    }

    async fn list_owned(&self, owner: &UserId) -> Result<Vec<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::owner_id.eq(owner.to_string()))
            .order(listings::created_at.desc())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_folds_case_and_wraps_wildcards() {
        assert_eq!(like_pattern("Rotavator"), "%rotavator%");
        assert_eq!(like_pattern("SEED potatoes"), "%seed potatoes%");
    }

    #[test]
    fn pool_errors_map_to_connection_failures() {
        let mapped = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(
            mapped,
            ListingPersistenceError::Connection { .. }
        ));
    }
}
