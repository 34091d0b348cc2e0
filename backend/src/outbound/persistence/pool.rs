//! Connection pools for the two database backends.
//!
//! PostgreSQL uses `diesel-async` with a `bb8` pool so queries never block
//! the runtime. The SQLite fallback has no async driver; its adapters hold a
//! small `r2d2` pool and hop onto the blocking thread pool per call.

use std::time::Duration;

use diesel::SqliteConnection;
use diesel::r2d2::{ConnectionManager, Pool as R2d2Pool, PooledConnection as R2d2Pooled};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const PG_MAX_CONNECTIONS: u32 = 10;
// SQLite serialises writers anyway; a large pool buys nothing.
const SQLITE_MAX_CONNECTIONS: u32 = 4;

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to check out a connection from the pool.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },
    /// Failed to build the connection pool.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Async PostgreSQL pool handed to the Postgres repository adapters.
#[derive(Clone)]
pub struct PgPool {
    inner: Pool<AsyncPgConnection>,
}

impl PgPool {
    /// Build a pool for the given connection string.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when the pool cannot be constructed.
    pub async fn connect(database_url: &str) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(PG_MAX_CONNECTIONS)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when no connection becomes available
    /// within the timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

/// Synchronous SQLite pool used by the fallback repository adapters.
#[derive(Clone)]
pub struct SqlitePool {
    inner: R2d2Pool<ConnectionManager<SqliteConnection>>,
}

impl SqlitePool {
    /// Build a pool for the given database file path.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when the pool cannot be constructed.
    pub fn connect(database_path: &str) -> Result<Self, PoolError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let inner = R2d2Pool::builder()
            .max_size(SQLITE_MAX_CONNECTIONS)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection. Callers run on the blocking thread pool.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when no connection becomes available
    /// within the timeout.
    pub fn get(
        &self,
    ) -> Result<R2d2Pooled<ConnectionManager<SqliteConnection>>, PoolError> {
        self.inner
            .get()
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_error_display_carries_cause() {
        assert!(
            PoolError::checkout("connection refused")
                .to_string()
                .contains("connection refused")
        );
        assert!(PoolError::build("bad url").to_string().contains("bad url"));
    }

    #[test]
    fn sqlite_pool_opens_in_memory_database() {
        let pool = SqlitePool::connect(":memory:").expect("pool builds");
        assert!(pool.get().is_ok());
    }
}
