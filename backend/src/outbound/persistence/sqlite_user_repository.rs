//! SQLite-backed `UserRepository` adapter, run on the blocking thread pool.

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{User, UserId, UserProfile};

use super::models::{ProfileChangeset, UserRow};
use super::pool::{PoolError, SqlitePool};
use super::schema::users;

/// Synchronous Diesel implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, operation: F) -> Result<T, UserPersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, UserPersistenceError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(map_pool_error)?;
            operation(&mut conn)
        })
        .await
        .map_err(|err| UserPersistenceError::query(format!("blocking task failed: {err}")))?
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    debug!(error = %error, "user query failed");
    UserPersistenceError::query(error.to_string())
}

fn map_row(row: UserRow) -> Result<User, UserPersistenceError> {
    User::try_from(row).map_err(UserPersistenceError::corrupt)
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let row = UserRow::from(user);
        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(row)
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = users::table
                .find(id)
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(map_row).transpose()
        })
        .await
    }

    async fn find_by_subject(
        &self,
        subject: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let subject = subject.to_owned();
        self.with_conn(move |conn| {
            let row = users::table
                .filter(users::subject.eq(subject))
                .select(UserRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(map_row).transpose()
        })
        .await
    }

    async fn update_profile(
        &self,
        id: &UserId,
        profile: &UserProfile,
    ) -> Result<bool, UserPersistenceError> {
        let id = id.to_string();
        let changes = ProfileChangeset::from(profile);
        self.with_conn(move |conn| {
            let affected = diesel::update(users::table.find(id))
                .set(changes)
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(affected > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::run_sqlite_migrations;
    use chrono::Utc;

    fn repository() -> SqliteUserRepository {
        let url = format!(
            "file:users_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let pool = SqlitePool::connect(&url).expect("pool");
        run_sqlite_migrations(&url).expect("migrations");
        SqliteUserRepository::new(pool)
    }

    fn user(subject: &str) -> User {
        User {
            id: UserId::generate(),
            subject: subject.to_owned(),
            profile: UserProfile {
                display_name: "Ada".to_owned(),
                email: Some("ada@example.com".to_owned()),
                phone: None,
                location: Some("Orchard Lane".to_owned()),
            },
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn insert_then_lookup_by_id_and_subject() {
        let repo = repository();
        let record = user("auth0|ada");
        repo.insert(&record).await.expect("insert");

        assert_eq!(
            repo.find_by_id(&record.id).await.expect("find"),
            Some(record.clone())
        );
        assert_eq!(
            repo.find_by_subject("auth0|ada").await.expect("find"),
            Some(record)
        );
        assert_eq!(
            repo.find_by_subject("auth0|nobody").await.expect("find"),
            None
        );
    }

    #[tokio::test]
    async fn update_profile_replaces_fields_and_clears_absent_ones() {
        let repo = repository();
        let record = user("auth0|ada");
        repo.insert(&record).await.expect("insert");

        let profile = UserProfile {
            display_name: "Ada L".to_owned(),
            email: None,
            phone: Some("01632 960983".to_owned()),
            location: None,
        };
        assert!(
            repo.update_profile(&record.id, &profile)
                .await
                .expect("update")
        );

        let stored = repo
            .find_by_id(&record.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.profile, profile);
        // Identity fields survive a profile update.
        assert_eq!(stored.subject, record.subject);
    }

    #[tokio::test]
    async fn update_profile_for_missing_user_reports_false() {
        let repo = repository();
        let profile = UserProfile {
            display_name: "Nobody".to_owned(),
            email: None,
            phone: None,
            location: None,
        };
        assert!(
            !repo
                .update_profile(&UserId::generate(), &profile)
                .await
                .expect("update")
        );
    }
}
