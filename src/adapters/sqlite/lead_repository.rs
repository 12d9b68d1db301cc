//! SQLite implementation of the LeadRepository.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::lesson_repository::insert_lesson;
use super::{format_datetime, parse_datetime, parse_string_list, to_u32};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{validate_score, Classification, Evidence, EvidenceSource, Lead, LeadOutcome};
use crate::domain::ports::LeadRepository;

const LEAD_COLUMNS: &str = "domain, name, tech_stack, employees, funding_stage, score, classification, created_at, updated_at";

/// SQLite-backed lead store.
#[derive(Clone)]
pub struct SqliteLeadRepository {
    pool: SqlitePool,
}

impl SqliteLeadRepository {
    /// Wrap an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Upsert one evidence node keyed by URL and link it to the lead.
/// An existing node keeps its original summary and retrieval time.
async fn link_evidence(
    tx: &mut Transaction<'_, Sqlite>,
    domain: &str,
    source: &EvidenceSource,
    now: &str,
) -> DomainResult<()> {
    sqlx::query(
        "INSERT INTO evidence (source_url, summary, retrieved_at) VALUES (?, ?, ?)
         ON CONFLICT(source_url) DO NOTHING",
    )
    .bind(source.url.trim())
    .bind(&source.summary)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO lead_evidence (lead_domain, source_url, linked_at) VALUES (?, ?, ?)",
    )
    .bind(domain)
    .bind(source.url.trim())
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn insert(&self, lead: &Lead) -> DomainResult<bool> {
        lead.validate().map_err(DomainError::ValidationFailed)?;
        let stack_json = serde_json::to_string(&lead.tech_stack)?;

        let result = sqlx::query(
            r#"INSERT INTO leads (domain, name, tech_stack, employees, funding_stage, score, classification, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(domain) DO NOTHING"#,
        )
        .bind(&lead.domain)
        .bind(&lead.name)
        .bind(&stack_json)
        .bind(lead.employees.map(i64::from))
        .bind(&lead.funding_stage)
        .bind(lead.score.map(i64::from))
        .bind(lead.classification.map(|c| c.as_str()))
        .bind(format_datetime(&lead.created_at))
        .bind(format_datetime(&lead.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, domain: &str) -> DomainResult<Option<Lead>> {
        let row: Option<LeadRow> =
            sqlx::query_as(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE domain = ?"))
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Lead>> {
        let rows: Vec<LeadRow> =
            sqlx::query_as(&format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY domain"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn leads_for(&self, version: u32) -> DomainResult<Vec<Lead>> {
        let rows: Vec<LeadRow> = sqlx::query_as(
            r#"SELECT l.domain, l.name, l.tech_stack, l.employees, l.funding_stage, l.score, l.classification, l.created_at, l.updated_at
               FROM leads l
               JOIN strategy_targets t ON t.lead_domain = l.domain
               WHERE t.strategy_version = ?
               ORDER BY l.domain"#,
        )
        .bind(i64::from(version))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_score(&self, domain: &str, score: u8) -> DomainResult<()> {
        validate_score(score).map_err(DomainError::ValidationFailed)?;

        let result = sqlx::query("UPDATE leads SET score = ?, updated_at = ? WHERE domain = ?")
            .bind(i64::from(score))
            .bind(format_datetime(&Utc::now()))
            .bind(domain)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UnknownLead(domain.to_string()));
        }
        Ok(())
    }

    async fn update_classification(
        &self,
        domain: &str,
        classification: Classification,
    ) -> DomainResult<()> {
        let result =
            sqlx::query("UPDATE leads SET classification = ?, updated_at = ? WHERE domain = ?")
                .bind(classification.as_str())
                .bind(format_datetime(&Utc::now()))
                .bind(domain)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UnknownLead(domain.to_string()));
        }
        Ok(())
    }

    async fn record_outcome(&self, outcome: &LeadOutcome) -> DomainResult<()> {
        if let Some(score) = outcome.score {
            validate_score(score).map_err(DomainError::ValidationFailed)?;
        }
        let now = format_datetime(&Utc::now().trunc_subsecs(6));

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE leads SET classification = ?, score = COALESCE(?, score), updated_at = ? WHERE domain = ?",
        )
        .bind(outcome.classification.as_str())
        .bind(outcome.score.map(i64::from))
        .bind(&now)
        .bind(&outcome.domain)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DomainError::UnknownLead(outcome.domain.clone()));
        }

        let mut linked = 0usize;
        for source in outcome.evidence.iter().filter(|s| s.has_url()) {
            link_evidence(&mut tx, &outcome.domain, source, &now).await?;
            linked += 1;
        }

        if let Some(lesson) = &outcome.lesson {
            insert_lesson(&mut tx, lesson).await?;
        }

        tx.commit().await?;

        debug!(
            domain = %outcome.domain,
            classification = %outcome.classification,
            evidence = linked,
            lesson = outcome.lesson.is_some(),
            "recorded lead outcome"
        );
        Ok(())
    }

    async fn evidence_for(&self, domain: &str) -> DomainResult<Vec<Evidence>> {
        let rows: Vec<EvidenceRow> = sqlx::query_as(
            r#"SELECT e.source_url, e.summary, e.retrieved_at
               FROM evidence e
               JOIN lead_evidence le ON le.source_url = e.source_url
               WHERE le.lead_domain = ?
               ORDER BY le.linked_at, e.source_url"#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn leads_citing(&self, source_url: &str) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT lead_domain FROM lead_evidence WHERE source_url = ? ORDER BY lead_domain",
        )
        .bind(source_url)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}

#[derive(sqlx::FromRow)]
struct LeadRow {
    domain: String,
    name: String,
    tech_stack: String,
    employees: Option<i64>,
    funding_stage: Option<String>,
    score: Option<i64>,
    classification: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LeadRow> for Lead {
    type Error = DomainError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let classification = row
            .classification
            .map(|c| {
                Classification::from_str(&c).ok_or_else(|| {
                    DomainError::SerializationError(format!("Invalid classification: {c}"))
                })
            })
            .transpose()?;

        let score = row
            .score
            .map(|s| {
                u8::try_from(s)
                    .map_err(|_| DomainError::SerializationError(format!("Invalid score: {s}")))
            })
            .transpose()?;

        Ok(Lead {
            domain: row.domain,
            name: row.name,
            tech_stack: parse_string_list(&row.tech_stack)?,
            employees: row.employees.map(|e| to_u32(e, "employees")).transpose()?,
            funding_stage: row.funding_stage,
            score,
            classification,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    source_url: String,
    summary: String,
    retrieved_at: String,
}

impl TryFrom<EvidenceRow> for Evidence {
    type Error = DomainError;

    fn try_from(row: EvidenceRow) -> Result<Self, Self::Error> {
        Ok(Evidence {
            source_url: row.source_url,
            summary: row.summary,
            retrieved_at: parse_datetime(&row.retrieved_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteLessonRepository};
    use crate::domain::models::{Lesson, LessonType};
    use crate::domain::ports::LessonRepository;

    async fn setup() -> (SqliteLeadRepository, SqliteLessonRepository) {
        let pool = create_migrated_test_pool().await.unwrap();
        (
            SqliteLeadRepository::new(pool.clone()),
            SqliteLessonRepository::new(pool),
        )
    }

    fn outcome(domain: &str, classification: Classification, urls: &[&str]) -> LeadOutcome {
        LeadOutcome {
            domain: domain.to_string(),
            classification,
            score: None,
            evidence: urls
                .iter()
                .map(|u| EvidenceSource::new(*u, format!("about {domain}")))
                .collect(),
            lesson: None,
        }
    }

    #[tokio::test]
    async fn test_insert_is_keyed_by_domain() {
        let (repo, _) = setup().await;
        let lead = Lead::new("stripe.com", "Stripe")
            .with_tech_stack(["Ruby", "Go"])
            .with_employees(8000)
            .with_funding_stage("Series I");

        assert!(repo.insert(&lead).await.unwrap());
        assert!(!repo.insert(&Lead::new("stripe.com", "Other")).await.unwrap());

        let stored = repo.get("stripe.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Stripe");
        assert_eq!(stored.tech_stack, vec!["Ruby", "Go"]);
        assert_eq!(stored.employees, Some(8000));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_score_overwrites() {
        let (repo, _) = setup().await;
        repo.insert(&Lead::new("linear.app", "Linear")).await.unwrap();

        repo.update_score("linear.app", 72).await.unwrap();
        repo.update_score("linear.app", 65).await.unwrap();

        let lead = repo.get("linear.app").await.unwrap().unwrap();
        assert_eq!(lead.score, Some(65));
    }

    #[tokio::test]
    async fn test_updates_on_unknown_lead_fail() {
        let (repo, _) = setup().await;
        let err = repo.update_score("missing.io", 50).await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownLead(ref d) if d == "missing.io"));

        let err = repo
            .update_classification("missing.io", Classification::Strike)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = repo
            .record_outcome(&outcome("missing.io", Classification::Monitor, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownLead(_)));
    }

    #[tokio::test]
    async fn test_update_score_rejects_out_of_range() {
        let (repo, _) = setup().await;
        repo.insert(&Lead::new("a.com", "A")).await.unwrap();
        let err = repo.update_score("a.com", 150).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_shared_source_url_yields_one_evidence_node() {
        let (repo, _) = setup().await;
        repo.insert(&Lead::new("a.com", "A")).await.unwrap();
        repo.insert(&Lead::new("b.com", "B")).await.unwrap();

        let shared = "https://news.example.com/db-outage";
        repo.record_outcome(&outcome("a.com", Classification::Monitor, &[shared, ""]))
            .await
            .unwrap();
        repo.record_outcome(&outcome("b.com", Classification::Strike, &[shared]))
            .await
            .unwrap();

        let (nodes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM evidence")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(nodes, 1);
        assert_eq!(repo.leads_citing(shared).await.unwrap(), vec!["a.com", "b.com"]);

        // First writer's summary wins
        let evidence = repo.evidence_for("b.com").await.unwrap();
        assert_eq!(evidence[0].summary, "about a.com");
    }

    #[tokio::test]
    async fn test_record_outcome_is_a_single_unit() {
        let (repo, lessons) = setup().await;
        repo.insert(&Lead::new("tiny.dev", "Tiny").with_score(40)).await.unwrap();

        let lesson = Lesson::for_lead("tiny.dev", LessonType::CompanyTooSmall, "Only 8 employees");
        let mut result = outcome("tiny.dev", Classification::Disregard, &["https://tiny.dev/blog"]);
        result.lesson = Some(lesson.clone());
        repo.record_outcome(&result).await.unwrap();

        let lead = repo.get("tiny.dev").await.unwrap().unwrap();
        assert_eq!(lead.classification, Some(Classification::Disregard));
        assert_eq!(lead.score, Some(40), "score untouched when outcome carries none");
        assert_eq!(lessons.for_lead("tiny.dev").await.unwrap(), vec![lesson.clone()]);

        // A duplicate lesson id aborts the whole unit, including the classification write
        let mut again = outcome("tiny.dev", Classification::Strike, &["https://tiny.dev/other"]);
        again.lesson = Some(lesson);
        assert!(repo.record_outcome(&again).await.is_err());

        let lead = repo.get("tiny.dev").await.unwrap().unwrap();
        assert_eq!(lead.classification, Some(Classification::Disregard));
        assert_eq!(repo.evidence_for("tiny.dev").await.unwrap().len(), 1);
    }
}
