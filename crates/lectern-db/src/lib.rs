//! # Lectern DB
//!
//! Document store abstraction for the Lectern API.
//!
//! - [`store`]: The [`DocumentStore`] trait, [`SetUpdate`] and [`StoreError`]
//! - [`postgres`]: [`PgStore`], one row per document over `sqlx`
//! - `memory`: `MemoryStore` with fault injection (feature `test-utils`)
//!
//! # Example
//!
//! ```ignore
//! use lectern_config::DatabaseConfig;
//! use lectern_db::{PgStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//! run_migrations(&pool).await?;
//! let store = PgStore::new(pool);
//! ```

use sqlx::postgres::PgPoolOptions;

use lectern_config::DatabaseConfig;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryStore, StoreOp};
pub use postgres::PgStore;
pub use store::{DocumentStore, SetUpdate, StoreError};

pub use sqlx::PgPool;

/// Opens a connection pool sized and timed by `config`.
///
/// A request that cannot get a connection within the acquire timeout fails
/// with [`StoreError::Timeout`] instead of hanging.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Database pool ready"
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Query(format!("migration failed: {}", e)))
}
