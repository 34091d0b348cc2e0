//! Diesel persistence adapters.
//!
//! The repository ports have two adapter families: PostgreSQL (managed
//! database, async via `diesel-async`) and SQLite (local fallback, sync
//! Diesel on the blocking pool). Both share the schema in [`schema`] and the
//! row mapping in [`models`].

pub mod migrations;
pub mod models;
pub mod pg_listing_repository;
pub mod pg_user_repository;
pub mod pool;
pub mod schema;
pub mod sqlite_listing_repository;
pub mod sqlite_user_repository;

pub use migrations::{MigrationError, run_postgres_migrations, run_sqlite_migrations};
pub use pg_listing_repository::PgListingRepository;
pub use pg_user_repository::PgUserRepository;
pub use pool::{PgPool, PoolError, SqlitePool};
pub use sqlite_listing_repository::SqliteListingRepository;
pub use sqlite_user_repository::SqliteUserRepository;

// Portable case folding for the search text filter; both backends ship
// LOWER().
diesel::define_sql_function! {
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text;
}
