//! SQLite implementation of the LessonRepository.

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::info;

use super::{format_datetime, parse_datetime, to_u32};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Lesson, LessonSubject, LessonType};
use crate::domain::ports::LessonRepository;

const LESSON_COLUMNS: &str = "lesson_id, lesson_type, details, timestamp, lead_domain, strategy_version";

/// SQLite-backed lesson store.
#[derive(Clone)]
pub struct SqliteLessonRepository {
    pool: SqlitePool,
}

impl SqliteLessonRepository {
    /// Wrap an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, filter: &str, bind: Option<LessonSubject>) -> DomainResult<Vec<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons {filter} ORDER BY timestamp, seq");
        let query = sqlx::query_as::<_, LessonRow>(&sql);
        let query = match bind {
            Some(LessonSubject::Lead(domain)) => query.bind(domain),
            Some(LessonSubject::Strategy(version)) => query.bind(i64::from(version)),
            None => query,
        };
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Insert a lesson on an open transaction, failing with a not-found error
/// when its subject does not exist.
pub(crate) async fn insert_lesson(
    tx: &mut Transaction<'_, Sqlite>,
    lesson: &Lesson,
) -> DomainResult<()> {
    insert_lesson_on(&mut **tx, lesson).await
}

async fn insert_lesson_on(conn: &mut SqliteConnection, lesson: &Lesson) -> DomainResult<()> {
    lesson.validate().map_err(DomainError::ValidationFailed)?;

    let query = match &lesson.subject {
        LessonSubject::Lead(domain) => sqlx::query(
            r#"INSERT INTO lessons (lesson_id, lesson_type, details, timestamp, lead_domain)
               SELECT ?, ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM leads WHERE domain = ?)"#,
        )
        .bind(&lesson.lesson_id)
        .bind(lesson.lesson_type.as_str())
        .bind(&lesson.details)
        .bind(format_datetime(&lesson.timestamp))
        .bind(domain)
        .bind(domain),
        LessonSubject::Strategy(version) => sqlx::query(
            r#"INSERT INTO lessons (lesson_id, lesson_type, details, timestamp, strategy_version)
               SELECT ?, ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM strategies WHERE version = ?)"#,
        )
        .bind(&lesson.lesson_id)
        .bind(lesson.lesson_type.as_str())
        .bind(&lesson.details)
        .bind(format_datetime(&lesson.timestamp))
        .bind(i64::from(*version))
        .bind(i64::from(*version)),
    };

    let result = query.execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(match &lesson.subject {
            LessonSubject::Lead(domain) => DomainError::UnknownLead(domain.clone()),
            LessonSubject::Strategy(version) => DomainError::UnknownStrategy(*version),
        });
    }
    Ok(())
}

#[async_trait]
impl LessonRepository for SqliteLessonRepository {
    async fn append(&self, lesson: &Lesson) -> DomainResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_lesson_on(&mut conn, lesson).await?;
        info!(
            lesson_id = %lesson.lesson_id,
            lesson_type = %lesson.lesson_type,
            subject = %lesson.subject,
            "lesson recorded"
        );
        Ok(())
    }

    async fn append_to_current_strategy(
        &self,
        lesson_type: LessonType,
        details: &str,
    ) -> DomainResult<Lesson> {
        // Placeholder subject; the real version is resolved by the INSERT itself
        // so that it names whichever strategy is current at write time.
        let mut lesson = Lesson::for_strategy(0, lesson_type, details);
        lesson.validate().map_err(DomainError::ValidationFailed)?;

        let result = sqlx::query(
            r#"INSERT INTO lessons (lesson_id, lesson_type, details, timestamp, strategy_version)
               SELECT ?, ?, ?, ?, version FROM strategies ORDER BY version DESC LIMIT 1"#,
        )
        .bind(&lesson.lesson_id)
        .bind(lesson_type.as_str())
        .bind(details)
        .bind(format_datetime(&lesson.timestamp))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NoStrategy);
        }

        let (version,): (i64,) =
            sqlx::query_as("SELECT strategy_version FROM lessons WHERE lesson_id = ?")
                .bind(&lesson.lesson_id)
                .fetch_one(&self.pool)
                .await?;
        lesson.subject = LessonSubject::Strategy(to_u32(version, "strategy_version")?);

        info!(
            lesson_id = %lesson.lesson_id,
            lesson_type = %lesson.lesson_type,
            subject = %lesson.subject,
            "strategy lesson recorded"
        );
        Ok(lesson)
    }

    async fn all_chronological(&self) -> DomainResult<Vec<Lesson>> {
        self.fetch("", None).await
    }

    async fn for_lead(&self, domain: &str) -> DomainResult<Vec<Lesson>> {
        self.fetch(
            "WHERE lead_domain = ?",
            Some(LessonSubject::Lead(domain.to_string())),
        )
        .await
    }

    async fn for_strategy(&self, version: u32) -> DomainResult<Vec<Lesson>> {
        self.fetch(
            "WHERE strategy_version = ?",
            Some(LessonSubject::Strategy(version)),
        )
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lessons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[derive(sqlx::FromRow)]
struct LessonRow {
    lesson_id: String,
    lesson_type: String,
    details: String,
    timestamp: String,
    lead_domain: Option<String>,
    strategy_version: Option<i64>,
}

impl TryFrom<LessonRow> for Lesson {
    type Error = DomainError;

    fn try_from(row: LessonRow) -> Result<Self, Self::Error> {
        let lesson_type = LessonType::from_str(&row.lesson_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid lesson type: {}", row.lesson_type))
        })?;

        let subject = match (row.lead_domain, row.strategy_version) {
            (Some(domain), None) => LessonSubject::Lead(domain),
            (None, Some(version)) => LessonSubject::Strategy(to_u32(version, "strategy_version")?),
            _ => {
                return Err(DomainError::SerializationError(format!(
                    "Lesson {} must belong to exactly one lead or strategy",
                    row.lesson_id
                )))
            }
        };

        Ok(Lesson {
            lesson_id: row.lesson_id,
            lesson_type,
            details: row.details,
            timestamp: parse_datetime(&row.timestamp)?,
            subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteLeadRepository, SqliteStrategyRepository,
    };
    use crate::domain::models::{Lead, StrategyDraft};
    use crate::domain::ports::{LeadRepository, StrategyRepository};

    struct Fixture {
        lessons: SqliteLessonRepository,
        strategies: SqliteStrategyRepository,
        leads: SqliteLeadRepository,
    }

    async fn setup() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        Fixture {
            lessons: SqliteLessonRepository::new(pool.clone()),
            strategies: SqliteStrategyRepository::new(pool.clone()),
            leads: SqliteLeadRepository::new(pool),
        }
    }

    #[tokio::test]
    async fn test_append_requires_existing_subject() {
        let f = setup().await;
        let orphan = Lesson::for_lead("ghost.io", LessonType::Disregard, "no such lead");
        assert!(matches!(
            f.lessons.append(&orphan).await.unwrap_err(),
            DomainError::UnknownLead(_)
        ));

        let orphan = Lesson::for_strategy(9, LessonType::TriggerPivot, "no such strategy");
        assert!(matches!(
            f.lessons.append(&orphan).await.unwrap_err(),
            DomainError::UnknownStrategy(9)
        ));
        assert_eq!(f.lessons.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lessons_come_back_in_timestamp_order() {
        let f = setup().await;
        f.leads.insert(&Lead::new("a.com", "A")).await.unwrap();
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let mut first = Lesson::for_lead("a.com", LessonType::Disregard, "first");
        let mut second = Lesson::for_strategy(1, LessonType::SegmentPivot, "second");
        let third = Lesson::for_lead("a.com", LessonType::CompanyTooSmall, "third");
        second.timestamp = third.timestamp - chrono::Duration::seconds(1);
        first.timestamp = second.timestamp - chrono::Duration::seconds(1);

        // Insert out of order
        f.lessons.append(&third).await.unwrap();
        f.lessons.append(&first).await.unwrap();
        f.lessons.append(&second).await.unwrap();

        let details: Vec<String> = f
            .lessons
            .all_chronological()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.details)
            .collect();
        assert_eq!(details, vec!["first", "second", "third"]);
        assert_eq!(f.lessons.for_lead("a.com").await.unwrap().len(), 2);
        assert_eq!(f.lessons.for_strategy(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_to_current_strategy_targets_max_version() {
        let f = setup().await;
        let err = f
            .lessons
            .append_to_current_strategy(LessonType::SegmentPivot, "rate too high")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoStrategy));

        let draft = StrategyDraft::new("icp");
        f.strategies.create_version(&draft, "p", None).await.unwrap();
        f.strategies.create_version(&draft, "p", Some(1)).await.unwrap();

        let lesson = f
            .lessons
            .append_to_current_strategy(LessonType::SegmentPivot, "rate too high")
            .await
            .unwrap();
        assert_eq!(lesson.subject, LessonSubject::Strategy(2));
        assert_eq!(f.lessons.for_strategy(2).await.unwrap(), vec![lesson]);
    }
}
