//! Pivot controller.
//!
//! Aggregates a validation pass and records a `SegmentPivot` lesson when the
//! failure rate is strictly above the threshold. Errored leads never reach
//! the aggregate: they are excluded from numerator and denominator alike.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Classification, LeadVerdict, LessonSubject, LessonType, PivotDecision, Strategy,
};
use crate::domain::ports::LessonRepository;

/// Disregard rate above which a pivot lesson is written.
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.6;

/// Details of a segment-pivot lesson.
pub fn pivot_details(rate: f64, threshold: f64, failing: &[&str]) -> String {
    format!(
        "Disregard rate {:.0}% exceeds {:.0}% threshold. Disregarded leads: {}. Strategy needs refinement.",
        rate * 100.0,
        threshold * 100.0,
        failing.join(", ")
    )
}

/// Decides whether a validation pass calls for a pivot.
pub struct PivotController {
    lessons: Arc<dyn LessonRepository>,
    threshold: f64,
}

impl PivotController {
    /// Controller pivoting above `threshold`.
    pub fn new(lessons: Arc<dyn LessonRepository>, threshold: f64) -> Self {
        Self { lessons, threshold }
    }

    /// Configured threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluate a finished pass against `strategy`.
    ///
    /// The lesson goes to whichever strategy is current when it is written,
    /// which may be newer than `strategy` if another submission raced us.
    pub async fn evaluate(&self, strategy: &Strategy, verdicts: &[LeadVerdict]) -> DomainResult<PivotDecision> {
        if verdicts.is_empty() {
            return Err(DomainError::EmptyValidationPass {
                version: strategy.version,
            });
        }

        let count = |label: Classification| verdicts.iter().filter(|v| v.classification == label).count();
        let total = verdicts.len();
        let strike = count(Classification::Strike);
        let monitor = count(Classification::Monitor);
        let disregard = count(Classification::Disregard);

        let failing: Vec<&str> = verdicts
            .iter()
            .filter(|v| v.classification.is_failure())
            .map(|v| v.company.as_str())
            .collect();
        let failure_rate = failing.len() as f64 / total as f64;
        let pivot_triggered = failure_rate > self.threshold;

        let mut decision = PivotDecision {
            total,
            strike,
            monitor,
            disregard,
            failure_rate,
            pivot_triggered,
            lesson_id: None,
            pivot_version: None,
        };

        if !pivot_triggered {
            return Ok(decision);
        }

        let details = pivot_details(failure_rate, self.threshold, &failing);
        let lesson = self
            .lessons
            .append_to_current_strategy(LessonType::SegmentPivot, &details)
            .await?;

        let pivot_version = match lesson.subject {
            LessonSubject::Strategy(v) => Some(v),
            LessonSubject::Lead(_) => None,
        };
        if pivot_version != Some(strategy.version) {
            warn!(
                evaluated = strategy.version,
                attached = ?pivot_version,
                "pivot lesson attached to a newer strategy"
            );
        }
        info!(
            version = strategy.version,
            failure_rate,
            lesson_id = %lesson.lesson_id,
            "segment pivot triggered"
        );

        decision.lesson_id = Some(lesson.lesson_id);
        decision.pivot_version = pivot_version;
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteLessonRepository, SqliteStrategyRepository,
    };
    use crate::domain::models::StrategyDraft;
    use crate::domain::ports::StrategyRepository;

    fn verdicts(disregard: usize, total: usize) -> Vec<LeadVerdict> {
        (0..total)
            .map(|i| LeadVerdict {
                company: format!("Company{i}"),
                domain: format!("c{i}.com"),
                classification: if i < disregard {
                    Classification::Disregard
                } else {
                    Classification::Monitor
                },
                previous_classification: None,
                lesson_type: None,
                lesson_details: None,
                lesson_id: None,
                evidence_count: 0,
            })
            .collect()
    }

    async fn setup() -> (PivotController, Arc<SqliteLessonRepository>, SqliteStrategyRepository) {
        let pool = create_migrated_test_pool().await.unwrap();
        let lessons = Arc::new(SqliteLessonRepository::new(pool.clone()));
        let controller = PivotController::new(lessons.clone(), DEFAULT_FAILURE_THRESHOLD);
        (controller, lessons, SqliteStrategyRepository::new(pool))
    }

    #[tokio::test]
    async fn test_seven_of_ten_triggers_pivot() {
        let (controller, lessons, strategies) = setup().await;
        let v1 = strategies.create_version(&StrategyDraft::new("icp"), "p", None).await.unwrap();

        let decision = controller.evaluate(&v1, &verdicts(7, 10)).await.unwrap();
        assert!(decision.pivot_triggered);
        assert_eq!(decision.disregard, 7);
        assert_eq!(decision.monitor, 3);
        assert_eq!(decision.pivot_version, Some(1));

        let recorded = lessons.for_strategy(1).await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].lesson_type, LessonType::SegmentPivot);
        assert!(recorded[0].details.starts_with("Disregard rate 70% exceeds 60% threshold."));
        assert!(recorded[0].details.contains("Company0, Company1"));
    }

    #[tokio::test]
    async fn test_six_of_ten_is_not_above_threshold() {
        let (controller, lessons, strategies) = setup().await;
        let v1 = strategies.create_version(&StrategyDraft::new("icp"), "p", None).await.unwrap();

        let decision = controller.evaluate(&v1, &verdicts(6, 10)).await.unwrap();
        assert!(!decision.pivot_triggered);
        assert!(decision.lesson_id.is_none());
        assert_eq!(lessons.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_pass_is_an_error() {
        let (controller, _, strategies) = setup().await;
        let v1 = strategies.create_version(&StrategyDraft::new("icp"), "p", None).await.unwrap();

        let err = controller.evaluate(&v1, &[]).await.unwrap_err();
        assert!(matches!(err, DomainError::EmptyValidationPass { version: 1 }));
    }

    #[tokio::test]
    async fn test_lesson_targets_strategy_current_at_emission() {
        let (controller, lessons, strategies) = setup().await;
        let v1 = strategies.create_version(&StrategyDraft::new("icp"), "p", None).await.unwrap();
        strategies
            .create_version(&StrategyDraft::new("newer"), "p", Some(1))
            .await
            .unwrap();

        let decision = controller.evaluate(&v1, &verdicts(9, 10)).await.unwrap();
        assert_eq!(decision.pivot_version, Some(2));
        assert!(lessons.for_strategy(1).await.unwrap().is_empty());
        assert_eq!(lessons.for_strategy(2).await.unwrap().len(), 1);
    }

    #[test]
    fn test_pivot_details_format() {
        assert_eq!(
            pivot_details(0.75, 0.6, &["A", "B"]),
            "Disregard rate 75% exceeds 60% threshold. Disregarded leads: A, B. Strategy needs refinement."
        );
    }
}
