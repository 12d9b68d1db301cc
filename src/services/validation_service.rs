//! Validation pass over every lead a strategy targets.
//!
//! Leads are scored with bounded parallelism; results come back in target
//! order. One lead failing never aborts the pass.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::lead_scorer::LeadScorer;
use super::pivot_controller::PivotController;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    round_rate, EventKind, Lead, LeadValidationResult, LeadVerdict, Strategy, ValidationReport,
};
use crate::domain::ports::{EventSink, LeadRepository, StrategyRepository};

/// Runs validation passes over a strategy's leads.
pub struct ValidationService {
    strategies: Arc<dyn StrategyRepository>,
    leads: Arc<dyn LeadRepository>,
    scorer: Arc<LeadScorer>,
    pivot: PivotController,
    events: Arc<dyn EventSink>,
    max_concurrency: usize,
}

impl ValidationService {
    /// Service validating up to `max_concurrency` leads at once.
    pub fn new(
        strategies: Arc<dyn StrategyRepository>,
        leads: Arc<dyn LeadRepository>,
        scorer: Arc<LeadScorer>,
        pivot: PivotController,
        events: Arc<dyn EventSink>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            strategies,
            leads,
            scorer,
            pivot,
            events,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Resolve the given version, or the latest one.
    pub async fn resolve_strategy(&self, version: Option<u32>) -> DomainResult<Strategy> {
        match version {
            Some(v) => self.strategies.get(v).await?.ok_or(DomainError::UnknownStrategy(v)),
            None => self.strategies.latest().await?.ok_or(DomainError::NoStrategy),
        }
    }

    /// Validate every lead of a strategy and decide whether to pivot.
    #[instrument(skip(self))]
    pub async fn run(&self, version: Option<u32>) -> DomainResult<ValidationReport> {
        let strategy = self.resolve_strategy(version).await?;
        let targets = self.leads.leads_for(strategy.version).await?;
        if targets.is_empty() {
            return Err(DomainError::EmptyValidationPass {
                version: strategy.version,
            });
        }

        let total = targets.len();
        self.events.publish(EventKind::ValidationStarted {
            version: strategy.version,
            total,
        });
        info!(version = strategy.version, total, "validation pass started");

        let results: Vec<LeadValidationResult> = stream::iter(targets.into_iter().enumerate())
            .map(|(idx, lead)| self.validate_one(lead, idx + 1, total, &strategy.product_description))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let verdicts: Vec<LeadVerdict> = results
            .iter()
            .filter_map(|r| match r {
                LeadValidationResult::Validated(v) => Some(v.clone()),
                LeadValidationResult::Failed { .. } => None,
            })
            .collect();
        let errored = results.len() - verdicts.len();

        let mut report = ValidationReport {
            strategy_version: strategy.version,
            product_description: strategy.product_description.clone(),
            total_leads: results.len(),
            strike: 0,
            monitor: 0,
            disregard: 0,
            errored,
            disregard_rate: 0.0,
            pivot_triggered: false,
            pivot_lesson_id: None,
            pivot_error: None,
            results,
        };

        match self.pivot.evaluate(&strategy, &verdicts).await {
            Ok(decision) => {
                report.strike = decision.strike;
                report.monitor = decision.monitor;
                report.disregard = decision.disregard;
                report.disregard_rate = round_rate(decision.failure_rate);
                report.pivot_triggered = decision.pivot_triggered;
                if let Some(lesson_id) = &decision.lesson_id {
                    self.events.publish(EventKind::PivotTriggered {
                        version: decision.pivot_version.unwrap_or(strategy.version),
                        disregard_rate: report.disregard_rate,
                        lesson_id: lesson_id.clone(),
                    });
                }
                report.pivot_lesson_id = decision.lesson_id;
            }
            Err(e) => {
                warn!(version = strategy.version, error = %e, "pivot evaluation failed");
                report.pivot_error = Some(e.to_string());
            }
        }

        self.events.publish(EventKind::ValidationCompleted {
            version: strategy.version,
            strike: report.strike,
            monitor: report.monitor,
            disregard: report.disregard,
            errored: report.errored,
            pivot_triggered: report.pivot_triggered,
        });
        info!(
            version = strategy.version,
            strike = report.strike,
            monitor = report.monitor,
            disregard = report.disregard,
            errored = report.errored,
            pivot = report.pivot_triggered,
            "validation pass completed"
        );

        Ok(report)
    }

    async fn validate_one(
        &self,
        lead: Lead,
        position: usize,
        total: usize,
        product_description: &str,
    ) -> LeadValidationResult {
        self.events.publish(EventKind::LeadValidating {
            domain: lead.domain.clone(),
            company: lead.name.clone(),
            progress: format!("{position}/{total}"),
        });

        match self.scorer.score(&lead, product_description).await {
            Ok(verdict) => {
                self.events.publish(EventKind::LeadValidated {
                    domain: verdict.domain.clone(),
                    company: verdict.company.clone(),
                    classification: verdict.classification,
                    lesson_type: verdict.lesson_type,
                });
                LeadValidationResult::Validated(verdict)
            }
            Err(e) => {
                warn!(domain = %lead.domain, error = %e, "lead validation failed");
                self.events.publish(EventKind::LeadValidationFailed {
                    domain: lead.domain.clone(),
                    company: lead.name.clone(),
                    error: e.to_string(),
                });
                LeadValidationResult::Failed {
                    domain: lead.domain,
                    company: lead.name,
                    error: e.to_string(),
                }
            }
        }
    }
}
