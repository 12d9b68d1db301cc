//! Reactive drafting for external market events.
//!
//! A competitor event (outage, price hike, ...) is mapped onto the current
//! strategy's leads. Leads whose stack mentions the competitor are targeted;
//! when none does, the event is treated as market-wide and every lead is.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EventKind, Lead, LessonType, OutreachEmail, Strategy, TriggerEvent, TriggerOutcome,
};
use crate::domain::ports::{EventSink, LeadRepository, LessonRepository, OutreachDrafter, StrategyRepository};

/// Leads whose stack mentions `competitor`, or all of them when none does.
/// The flag is true in the fallback case.
pub fn affected_leads(leads: Vec<Lead>, competitor: &str) -> (Vec<Lead>, bool) {
    let matching: Vec<Lead> = leads
        .iter()
        .filter(|l| l.mentions_technology(competitor))
        .cloned()
        .collect();

    if matching.is_empty() {
        let broadcast = !leads.is_empty();
        (leads, broadcast)
    } else {
        (matching, false)
    }
}

/// Details of a trigger-pivot lesson.
pub fn trigger_lesson_details(event: &TriggerEvent, drafted: usize) -> String {
    format!(
        "Detected {} for {}. Drafted {drafted} outreach email(s).",
        event.status, event.competitor
    )
}

/// Turns a trigger event into outreach for the affected leads.
pub struct TriggerPivotDrafter {
    strategies: Arc<dyn StrategyRepository>,
    leads: Arc<dyn LeadRepository>,
    lessons: Arc<dyn LessonRepository>,
    drafter: Arc<dyn OutreachDrafter>,
    events: Arc<dyn EventSink>,
    max_concurrency: usize,
}

impl TriggerPivotDrafter {
    /// Drafter running up to `max_concurrency` drafts at once.
    pub fn new(
        strategies: Arc<dyn StrategyRepository>,
        leads: Arc<dyn LeadRepository>,
        lessons: Arc<dyn LessonRepository>,
        drafter: Arc<dyn OutreachDrafter>,
        events: Arc<dyn EventSink>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            strategies,
            leads,
            lessons,
            drafter,
            events,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Handle one event. Any drafting failure aborts before the lesson is
    /// written.
    #[instrument(skip(self, event), fields(competitor = %event.competitor, status = %event.status))]
    pub async fn handle(&self, event: &TriggerEvent) -> DomainResult<TriggerOutcome> {
        event.validate().map_err(DomainError::ValidationFailed)?;
        self.events.publish(EventKind::TriggerReceived {
            competitor: event.competitor.clone(),
            status: event.status.clone(),
        });

        let strategy = self.strategies.latest().await?.ok_or(DomainError::NoStrategy)?;
        let targets = self.leads.leads_for(strategy.version).await?;
        let (affected, broadcast) = affected_leads(targets, &event.competitor);

        let emails: Vec<OutreachEmail> = stream::iter(affected.iter())
            .map(|lead| self.draft_for(lead, event, &strategy))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let lesson_id = if affected.is_empty() {
            None
        } else {
            let lesson = self
                .lessons
                .append_to_current_strategy(
                    LessonType::TriggerPivot,
                    &trigger_lesson_details(event, emails.len()),
                )
                .await?;
            Some(lesson.lesson_id)
        };

        self.events.publish(EventKind::TriggerHandled {
            version: strategy.version,
            affected_leads: affected.len(),
            lesson_id: lesson_id.clone(),
        });
        info!(
            version = strategy.version,
            affected = affected.len(),
            broadcast,
            "trigger handled"
        );

        Ok(TriggerOutcome {
            strategy_version: strategy.version,
            competitor: event.competitor.clone(),
            status: event.status.clone(),
            affected_leads: affected.len(),
            broadcast,
            emails,
            lesson_id,
        })
    }

    async fn draft_for(&self, lead: &Lead, event: &TriggerEvent, strategy: &Strategy) -> DomainResult<OutreachEmail> {
        let draft = self.drafter.draft(lead, event, strategy).await?;
        self.events.publish(EventKind::OutreachDrafted {
            domain: lead.domain.clone(),
            subject: draft.subject.clone(),
        });
        Ok(OutreachEmail {
            company: lead.name.clone(),
            domain: lead.domain.clone(),
            subject: draft.subject,
            body: draft.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{RecordingEventSink, ScriptedDrafter};
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteLeadRepository, SqliteLessonRepository,
        SqliteStrategyRepository,
    };
    use crate::domain::models::{OutreachDraft, StrategyDraft};

    fn lead(domain: &str, stack: &[&str]) -> Lead {
        Lead::new(domain, domain.trim_end_matches(".com")).with_tech_stack(stack.iter().copied())
    }

    #[test]
    fn test_affected_leads_substring_match() {
        let leads = vec![
            lead("a.com", &["DigitalOcean Droplets", "Postgres"]),
            lead("b.com", &["AWS"]),
        ];
        let (affected, broadcast) = affected_leads(leads, "digitalocean");
        assert_eq!(affected.len(), 1);
        assert_eq!(affected[0].domain, "a.com");
        assert!(!broadcast);
    }

    #[test]
    fn test_affected_leads_falls_back_to_all() {
        let leads = vec![lead("a.com", &["AWS"]), lead("b.com", &["GCP"])];
        let (affected, broadcast) = affected_leads(leads, "DigitalOcean");
        assert_eq!(affected.len(), 2);
        assert!(broadcast);

        let (affected, broadcast) = affected_leads(Vec::new(), "DigitalOcean");
        assert!(affected.is_empty());
        assert!(!broadcast);
    }

    struct Fixture {
        strategies: Arc<SqliteStrategyRepository>,
        leads: Arc<SqliteLeadRepository>,
        lessons: Arc<SqliteLessonRepository>,
    }

    async fn fixture() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        Fixture {
            strategies: Arc::new(SqliteStrategyRepository::new(pool.clone())),
            leads: Arc::new(SqliteLeadRepository::new(pool.clone())),
            lessons: Arc::new(SqliteLessonRepository::new(pool)),
        }
    }

    fn drafter(f: &Fixture, drafts: Arc<ScriptedDrafter>) -> TriggerPivotDrafter {
        TriggerPivotDrafter::new(
            f.strategies.clone(),
            f.leads.clone(),
            f.lessons.clone(),
            drafts,
            Arc::new(RecordingEventSink::new()),
            2,
        )
    }

    #[tokio::test]
    async fn test_no_strategy_fails() {
        let f = fixture().await;
        let err = drafter(&f, Arc::new(ScriptedDrafter::new()))
            .handle(&TriggerEvent::new("outage", "Heroku"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoStrategy));
    }

    #[tokio::test]
    async fn test_matching_leads_get_drafts_and_lesson() {
        let f = fixture().await;
        f.leads.insert(&lead("a.com", &["Heroku"])).await.unwrap();
        f.leads.insert(&lead("b.com", &["AWS"])).await.unwrap();
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let drafts = Arc::new(ScriptedDrafter::new());
        let outcome = drafter(&f, drafts.clone())
            .handle(&TriggerEvent::new("price_hike", "heroku"))
            .await
            .unwrap();

        assert_eq!(outcome.affected_leads, 1);
        assert!(!outcome.broadcast);
        assert_eq!(outcome.emails[0].domain, "a.com");
        assert_eq!(drafts.drafted_for().await, vec!["a.com"]);

        let lessons = f.lessons.for_strategy(1).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson_type, LessonType::TriggerPivot);
        assert_eq!(
            lessons[0].details,
            "Detected price_hike for heroku. Drafted 1 outreach email(s)."
        );
        assert_eq!(outcome.lesson_id, Some(lessons[0].lesson_id.clone()));
    }

    /// Drafter that moves the lineage forward while the trigger is in flight.
    struct AdvancingDrafter {
        strategies: Arc<SqliteStrategyRepository>,
    }

    #[async_trait::async_trait]
    impl OutreachDrafter for AdvancingDrafter {
        fn name(&self) -> &'static str {
            "advancing"
        }

        async fn draft(
            &self,
            _lead: &Lead,
            _event: &TriggerEvent,
            strategy: &Strategy,
        ) -> DomainResult<OutreachDraft> {
            self.strategies
                .create_version(&StrategyDraft::new("newer icp"), "p", Some(strategy.version))
                .await?;
            Ok(OutreachDraft {
                subject: "hi".to_string(),
                body: "body".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_lesson_lands_on_strategy_current_at_write_time() {
        let f = fixture().await;
        f.leads.insert(&lead("a.com", &["Heroku"])).await.unwrap();
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let handler = TriggerPivotDrafter::new(
            f.strategies.clone(),
            f.leads.clone(),
            f.lessons.clone(),
            Arc::new(AdvancingDrafter {
                strategies: f.strategies.clone(),
            }),
            Arc::new(RecordingEventSink::new()),
            1,
        );
        let outcome = handler
            .handle(&TriggerEvent::new("outage", "Heroku"))
            .await
            .unwrap();

        assert_eq!(outcome.strategy_version, 1);
        assert!(f.lessons.for_strategy(1).await.unwrap().is_empty());
        let lessons = f.lessons.for_strategy(2).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson_type, LessonType::TriggerPivot);
        assert_eq!(outcome.lesson_id, Some(lessons[0].lesson_id.clone()));
    }

    #[tokio::test]
    async fn test_five_unmatched_leads_all_receive_drafts() {
        let f = fixture().await;
        for (domain, stack) in [
            ("a.com", "AWS"),
            ("b.com", "GCP"),
            ("c.com", "Azure"),
            ("d.com", "Heroku"),
            ("e.com", "Fly.io"),
        ] {
            f.leads.insert(&lead(domain, &[stack])).await.unwrap();
        }
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let drafts = Arc::new(ScriptedDrafter::new());
        let outcome = drafter(&f, drafts.clone())
            .handle(&TriggerEvent::new("price_hike", "DigitalOcean"))
            .await
            .unwrap();

        assert_eq!(outcome.affected_leads, 5);
        assert!(outcome.broadcast);
        assert_eq!(outcome.emails.len(), 5);
        assert_eq!(drafts.drafted_for().await.len(), 5);
        assert_eq!(f.lessons.for_strategy(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_leads_writes_no_lesson() {
        let f = fixture().await;
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let outcome = drafter(&f, Arc::new(ScriptedDrafter::new()))
            .handle(&TriggerEvent::new("outage", "DigitalOcean"))
            .await
            .unwrap();
        assert_eq!(outcome.affected_leads, 0);
        assert!(outcome.lesson_id.is_none());
        assert_eq!(f.lessons.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_draft_failure_aborts_without_lesson() {
        let f = fixture().await;
        f.leads.insert(&lead("a.com", &["AWS"])).await.unwrap();
        f.leads.insert(&lead("b.com", &["GCP"])).await.unwrap();
        f.strategies
            .create_version(&StrategyDraft::new("icp"), "p", None)
            .await
            .unwrap();

        let drafts = Arc::new(ScriptedDrafter::new().with_failure("b.com"));
        let err = drafter(&f, drafts)
            .handle(&TriggerEvent::new("outage", "DigitalOcean"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProviderError { .. }));
        assert_eq!(f.lessons.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_competitor_is_rejected() {
        let f = fixture().await;
        let err = drafter(&f, Arc::new(ScriptedDrafter::new()))
            .handle(&TriggerEvent::new("outage", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }
}
