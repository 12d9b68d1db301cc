//! The Hunter facade.
//!
//! Exposes the three operations the surrounding service layer drives:
//! submitting a product, running a validation pass and handling a market
//! trigger. Administrative lead and lesson access sits alongside.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    validate_score, EventKind, Evidence, Lead, Lesson, NewLead, Strategy, TriggerEvent,
    TriggerOutcome, ValidationReport,
};
use crate::domain::ports::{EventSink, LeadRepository, LessonRepository};
use crate::services::{StrategyGeneration, StrategyService, TriggerPivotDrafter, ValidationService};

/// One generate-then-validate round of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRound {
    /// The strategy generated this round
    pub generation: StrategyGeneration,
    /// Report of the validation pass, when one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    /// Why validation could not run, e.g. no leads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl SubmissionRound {
    fn pivoted(&self) -> bool {
        self.validation.as_ref().is_some_and(|r| r.pivot_triggered)
    }
}

/// Every round run for one product description.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Rounds in the order they ran
    pub rounds: Vec<SubmissionRound>,
}

impl Submission {
    /// Version produced by the last round.
    pub fn final_version(&self) -> Option<u32> {
        self.rounds.last().map(|r| r.generation.version())
    }
}

/// Result of a lead import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Leads written
    pub inserted: usize,
    /// Domains that already existed
    pub skipped: Vec<String>,
}

/// Lead with everything recorded against it.
#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    /// The lead record
    pub lead: Lead,
    /// Evidence linked to the lead, in link order
    pub evidence: Vec<Evidence>,
    /// Lessons recorded against the lead
    pub lessons: Vec<Lesson>,
}

/// Facade the CLI drives: strategy generation, validation, triggers and lookups.
pub struct Hunter {
    strategies: StrategyService,
    validation: ValidationService,
    triggers: TriggerPivotDrafter,
    leads: Arc<dyn LeadRepository>,
    lessons: Arc<dyn LessonRepository>,
    events: Arc<dyn EventSink>,
    refinement_cycles: u32,
}

impl Hunter {
    /// Wire the services over shared repositories and one event sink.
    pub fn new(
        strategies: StrategyService,
        validation: ValidationService,
        triggers: TriggerPivotDrafter,
        leads: Arc<dyn LeadRepository>,
        lessons: Arc<dyn LessonRepository>,
        events: Arc<dyn EventSink>,
        refinement_cycles: u32,
    ) -> Self {
        Self {
            strategies,
            validation,
            triggers,
            leads,
            lessons,
            events,
            refinement_cycles,
        }
    }

    fn report_error<T>(&self, stage: &str, result: DomainResult<T>) -> DomainResult<T> {
        if let Err(e) = &result {
            self.events.publish(EventKind::agent_error(stage, e.to_string()));
        }
        result
    }

    /// Research, compose or refine, store, validate. While a pass pivots and
    /// cycles remain, refine again against the same research.
    #[instrument(skip(self, description))]
    pub async fn submit_product(&self, description: &str, cycles: Option<u32>) -> DomainResult<Submission> {
        let description = description.trim();
        if description.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Product description cannot be empty".to_string(),
            ));
        }
        let cycles = cycles.unwrap_or(self.refinement_cycles);

        let generation = self.report_error("strategy", self.strategies.generate(description).await)?;
        let mut rounds = vec![self.validate_round(generation).await];

        let mut done = 0;
        while done < cycles && rounds.last().is_some_and(SubmissionRound::pivoted) {
            done += 1;
            info!(cycle = done, "refining after pivot");
            let research = rounds
                .last()
                .map(|r| r.generation.research.clone())
                .unwrap_or_default();
            let generation =
                self.report_error("strategy", self.strategies.evolve(description, research).await)?;
            rounds.push(self.validate_round(generation).await);
        }

        Ok(Submission { rounds })
    }

    async fn validate_round(&self, generation: StrategyGeneration) -> SubmissionRound {
        match self.run_validation(Some(generation.version())).await {
            Ok(report) => SubmissionRound {
                generation,
                validation: Some(report),
                validation_error: None,
            },
            Err(e) => {
                warn!(version = generation.version(), error = %e, "validation after submission failed");
                SubmissionRound {
                    generation,
                    validation: None,
                    validation_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Validate `version`, or the latest strategy.
    pub async fn run_validation(&self, version: Option<u32>) -> DomainResult<ValidationReport> {
        self.report_error("validation", self.validation.run(version).await)
    }

    /// Draft outreach for a trigger event.
    pub async fn handle_trigger(&self, event: &TriggerEvent) -> DomainResult<TriggerOutcome> {
        self.report_error("trigger", self.triggers.handle(event).await)
    }

    /// Run one generation without validating it.
    pub async fn generate_strategy(&self, description: &str) -> DomainResult<StrategyGeneration> {
        self.report_error("strategy", self.strategies.generate(description).await)
    }

    /// Fetch `version`, or the latest strategy.
    pub async fn strategy(&self, version: Option<u32>) -> DomainResult<Strategy> {
        match version {
            Some(v) => self.strategies.get(v).await,
            None => self.strategies.latest().await,
        }
    }

    /// All strategies, newest first.
    pub async fn strategies(&self) -> DomainResult<Vec<Strategy>> {
        self.strategies.list().await
    }

    /// All leads.
    pub async fn leads(&self) -> DomainResult<Vec<Lead>> {
        self.leads.list().await
    }

    /// A lead with its evidence and lessons.
    pub async fn lead_detail(&self, domain: &str) -> DomainResult<LeadDetail> {
        let lead = self
            .leads
            .get(domain)
            .await?
            .ok_or_else(|| DomainError::UnknownLead(domain.to_string()))?;
        Ok(LeadDetail {
            evidence: self.leads.evidence_for(domain).await?,
            lessons: self.lessons.for_lead(domain).await?,
            lead,
        })
    }

    /// Insert leads, skipping domains that already exist.
    pub async fn import_leads(&self, records: Vec<NewLead>) -> DomainResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        for record in records {
            let lead = Lead::from(record);
            lead.validate().map_err(DomainError::ValidationFailed)?;
            if self.leads.insert(&lead).await? {
                summary.inserted += 1;
            } else {
                summary.skipped.push(lead.domain);
            }
        }
        Ok(summary)
    }

    /// Overwrite a lead's score (0-100).
    pub async fn set_score(&self, domain: &str, score: u8) -> DomainResult<()> {
        validate_score(score).map_err(DomainError::ValidationFailed)?;
        self.leads.update_score(domain, score).await
    }

    /// Lessons recorded against a lead.
    pub async fn lessons_for_lead(&self, domain: &str) -> DomainResult<Vec<Lesson>> {
        self.lessons.for_lead(domain).await
    }

    /// Lessons recorded against a strategy version.
    pub async fn lessons_for_strategy(&self, version: u32) -> DomainResult<Vec<Lesson>> {
        self.lessons.for_strategy(version).await
    }

    /// Every lesson, oldest first.
    pub async fn all_lessons(&self) -> DomainResult<Vec<Lesson>> {
        self.lessons.all_chronological().await
    }
}
