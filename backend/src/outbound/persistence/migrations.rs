//! Embedded schema migrations, applied once at startup for whichever
//! backend the configuration selected.

use diesel::{Connection, SqliteConnection};
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failures while preparing the database schema.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {0}")]
    Connection(String),
    #[error("failed to apply migrations: {0}")]
    Apply(String),
}

/// Apply pending migrations to the SQLite database at `path`.
///
/// # Errors
/// Returns a [`MigrationError`] when the database cannot be opened or a
/// migration fails.
pub fn run_sqlite_migrations(path: &str) -> Result<(), MigrationError> {
    let mut conn = SqliteConnection::establish(path)
        .map_err(|err| MigrationError::Connection(err.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply(err.to_string()))?;
    info!(count = applied.len(), backend = "sqlite", "migrations applied");
    Ok(())
}

/// Apply pending migrations to the PostgreSQL database at `database_url`.
///
/// The migration harness is synchronous, so the async connection is wrapped
/// and driven on the blocking pool.
///
/// # Errors
/// Returns a [`MigrationError`] when the database cannot be reached or a
/// migration fails.
pub async fn run_postgres_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&url)
            .map_err(|err| MigrationError::Connection(err.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Apply(err.to_string()))?;
        info!(
            count = applied.len(),
            backend = "postgres",
            "migrations applied"
        );
        Ok(())
    })
    .await
    .map_err(|err| MigrationError::Apply(format!("migration task failed: {err}")))?
}
