//! Persistence layer: row models, PostgreSQL repositories and the store
//! ports the review workflow is written against.
//!
//! - [`repositories`] hold the SQL, one zero-sized struct per table.
//! - [`store`] defines the [`ReviewStore`], [`NotificationStore`] and
//!   [`UserDirectory`] ports.
//! - [`PgStore`] implements the ports over a [`DbPool`]; [`MemoryStore`]
//!   implements them in process for tests and local runs.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{NotificationStore, ReviewStore, UserDirectory};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
