//! SQLite implementation of the StrategyRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{format_datetime, parse_datetime, parse_string_list, to_u32};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Strategy, StrategyDraft};
use crate::domain::ports::StrategyRepository;

const STRATEGY_COLUMNS: &str =
    "version, product_description, icp, keywords, competitors, created_at, evolved_from";

/// SQLite-backed strategy store.
#[derive(Clone)]
pub struct SqliteStrategyRepository {
    pool: SqlitePool,
}

impl SqliteStrategyRepository {
    /// Wrap an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn current_version(&self) -> DomainResult<Option<u32>> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM strategies")
            .fetch_one(&self.pool)
            .await?;
        max.map(|v| to_u32(v, "version")).transpose()
    }
}

#[async_trait]
impl StrategyRepository for SqliteStrategyRepository {
    async fn create_version(
        &self,
        draft: &StrategyDraft,
        product_description: &str,
        prev_version: Option<u32>,
    ) -> DomainResult<Strategy> {
        let expected_max = prev_version.unwrap_or(0);
        let version = expected_max + 1;
        let strategy = Strategy::from_draft(version, product_description, draft.clone(), prev_version);

        let keywords_json = serde_json::to_string(&strategy.keywords)?;
        let competitors_json = serde_json::to_string(&strategy.competitors)?;

        let mut tx = self.pool.begin().await?;

        // The first statement is a write so the transaction takes the write
        // lock up front; the WHERE clause is the version guard.
        let inserted = sqlx::query(
            r#"INSERT INTO strategies (version, product_description, icp, keywords, competitors, created_at, evolved_from)
               SELECT ?, ?, ?, ?, ?, ?, ?
               WHERE (SELECT COALESCE(MAX(version), 0) FROM strategies) = ?"#,
        )
        .bind(i64::from(version))
        .bind(&strategy.product_description)
        .bind(&strategy.icp)
        .bind(&keywords_json)
        .bind(&competitors_json)
        .bind(format_datetime(&strategy.created_at))
        .bind(prev_version.map(i64::from))
        .bind(i64::from(expected_max))
        .execute(&mut *tx)
        .await;

        let rows = match inserted {
            Ok(result) => result.rows_affected(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => 0,
            Err(e) => return Err(e.into()),
        };

        if rows == 0 {
            tx.rollback().await?;
            let current = self.current_version().await?;
            debug!(attempted = version, ?current, "strategy version conflict");
            return Err(DomainError::VersionConflict {
                attempted: version,
                current,
            });
        }

        let targets = sqlx::query(
            "INSERT INTO strategy_targets (strategy_version, lead_domain) SELECT ?, domain FROM leads",
        )
        .bind(i64::from(version))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            version,
            evolved_from = ?prev_version,
            targets,
            "stored strategy version"
        );
        Ok(strategy)
    }

    async fn latest(&self) -> DomainResult<Option<Strategy>> {
        let row: Option<StrategyRow> = sqlx::query_as(&format!(
            "SELECT {STRATEGY_COLUMNS} FROM strategies ORDER BY version DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get(&self, version: u32) -> DomainResult<Option<Strategy>> {
        let row: Option<StrategyRow> = sqlx::query_as(&format!(
            "SELECT {STRATEGY_COLUMNS} FROM strategies WHERE version = ?"
        ))
        .bind(i64::from(version))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Strategy>> {
        let rows: Vec<StrategyRow> = sqlx::query_as(&format!(
            "SELECT {STRATEGY_COLUMNS} FROM strategies ORDER BY version DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn target_count(&self, version: u32) -> DomainResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM strategy_targets WHERE strategy_version = ?")
                .bind(i64::from(version))
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}

#[derive(sqlx::FromRow)]
struct StrategyRow {
    version: i64,
    product_description: String,
    icp: String,
    keywords: String,
    competitors: String,
    created_at: String,
    evolved_from: Option<i64>,
}

impl TryFrom<StrategyRow> for Strategy {
    type Error = DomainError;

    fn try_from(row: StrategyRow) -> Result<Self, Self::Error> {
        Ok(Strategy {
            version: to_u32(row.version, "version")?,
            product_description: row.product_description,
            icp: row.icp,
            keywords: parse_string_list(&row.keywords)?,
            competitors: parse_string_list(&row.competitors)?,
            created_at: parse_datetime(&row.created_at)?,
            evolved_from: row
                .evolved_from
                .map(|v| to_u32(v, "evolved_from"))
                .transpose()?,
        })
    }
}
