//! SQLite database migration management.

use sqlx::SqlitePool;
use thiserror::Error;

/// Migration failures.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration's SQL failed; the transaction was rolled back
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError {
        /// Version of the failing migration
        version: i64,
        /// Underlying SQL error
        #[source]
        source: sqlx::Error,
    },
    /// The schema version table could not be read
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

/// An embedded schema migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Applied in ascending order
    pub version: i64,
    /// Recorded alongside the version
    pub description: String,
    /// Statements executed in one transaction
    pub sql: String,
}

/// Applies pending migrations in version order.
pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    /// Migrator over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the recorded schema version.
    /// Returns the number applied.
    pub async fn run_embedded_migrations(
        &self,
        migrations: Vec<Migration>,
    ) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let pending: Vec<_> = migrations
            .into_iter()
            .filter(|m| m.version > current_version)
            .collect();

        for migration in &pending {
            tracing::debug!(version = migration.version, description = %migration.description, "applying migration");
            self.apply_migration(migration).await?;
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError { version: 0, source: e })?;
        Ok(())
    }

    /// Highest applied version, 0 on a fresh database.
    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let (version,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await
                .map_err(MigrationError::VersionCheckError)?;
        Ok(version)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let wrap = |e: sqlx::Error| MigrationError::ExecutionError {
            version: migration.version,
            source: e,
        };

        let mut tx = self.pool.begin().await.map_err(wrap)?;
        sqlx::raw_sql(&migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(wrap)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(wrap)?;
        tx.commit().await.map_err(wrap)?;
        Ok(())
    }
}

/// Strategies, leads, evidence and lessons tables.
pub fn initial_schema_migration() -> Migration {
    Migration {
        version: 1,
        description: "Strategies, leads, evidence and lessons".to_string(),
        sql: include_str!("../../../migrations/001_initial_schema.sql").to_string(),
    }
}

/// Every migration compiled into the binary.
pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![initial_schema_migration()]
}
