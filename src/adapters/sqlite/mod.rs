//! SQLite persistence adapters for the hunter agent.

pub mod connection;
pub mod lead_repository;
pub mod lesson_repository;
pub mod migrations;
pub mod strategy_repository;

pub use connection::{
    create_pool, create_test_pool, database_url, verify_connection, ConnectionError, PoolConfig,
};
pub use lead_repository::SqliteLeadRepository;
pub use lesson_repository::SqliteLessonRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use strategy_repository::SqliteStrategyRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};

/// Fixed-width RFC3339 so that text ordering equals chronological ordering.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a JSON array column into a list of strings.
pub fn parse_string_list(s: &str) -> DomainResult<Vec<String>> {
    serde_json::from_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Narrow an INTEGER column to `u32`.
pub fn to_u32(value: i64, column: &str) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("{column} out of range: {value}")))
}

/// Errors from database setup.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Pool setup failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    /// Any other query failure
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, DatabaseError> {
    let config = PoolConfig {
        max_connections,
        ..PoolConfig::default()
    };
    let pool = create_pool(database_url, Some(config)).await?;
    let migrator = Migrator::new(pool.clone());
    migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    Ok(pool)
}

/// Delete every row. The only path through which leads are ever removed.
pub async fn reset_database(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for table in [
        "lessons",
        "lead_evidence",
        "evidence",
        "strategy_targets",
        "strategies",
        "leads",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::warn!("database reset: all strategies, leads, evidence and lessons deleted");
    Ok(())
}
