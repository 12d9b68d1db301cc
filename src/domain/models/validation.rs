//! Per-lead verdicts and the report of a validation pass.

use serde::{Deserialize, Serialize};

use super::lead::Classification;
use super::lesson::LessonType;

/// Outcome of validating one lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadVerdict {
    /// Company name
    pub company: String,
    /// Lead domain
    pub domain: String,
    /// Classification written for the lead
    pub classification: Classification,
    /// Classification before this pass
    pub previous_classification: Option<Classification>,
    /// Type of the lesson recorded, if any
    pub lesson_type: Option<LessonType>,
    /// Details of the lesson recorded
    pub lesson_details: Option<String>,
    /// Id of the lesson recorded
    pub lesson_id: Option<String>,
    /// URL-bearing sources linked to the lead
    pub evidence_count: usize,
}

/// Per-lead entry in a validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LeadValidationResult {
    /// The lead was classified
    Validated(LeadVerdict),
    /// The lead could not be validated
    Failed {
        /// Lead domain
        domain: String,
        /// Company name
        company: String,
        /// Failure message
        error: String,
    },
}

impl LeadValidationResult {
    /// Lead domain, whatever the outcome.
    pub fn domain(&self) -> &str {
        match self {
            Self::Validated(v) => &v.domain,
            Self::Failed { domain, .. } => domain,
        }
    }

    /// Company name, whatever the outcome.
    pub fn company(&self) -> &str {
        match self {
            Self::Validated(v) => &v.company,
            Self::Failed { company, .. } => company,
        }
    }

    /// `None` for failed leads.
    pub fn classification(&self) -> Option<Classification> {
        match self {
            Self::Validated(v) => Some(v.classification),
            Self::Failed { .. } => None,
        }
    }

    /// True when the lead could not be validated.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Aggregate decision over a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotDecision {
    /// Leads that produced a classification; errored leads are excluded.
    pub total: usize,
    /// Classified as Strike
    pub strike: usize,
    /// Classified as Monitor
    pub monitor: usize,
    /// Classified as Disregard
    pub disregard: usize,
    /// Disregard count over `total`
    pub failure_rate: f64,
    /// Whether `failure_rate` crossed the threshold
    pub pivot_triggered: bool,
    /// The segment-pivot lesson
    pub lesson_id: Option<String>,
    /// Strategy the pivot lesson was attached to.
    pub pivot_version: Option<u32>,
}

/// Everything one validation pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Strategy validated
    pub strategy_version: u32,
    /// Product description the strategy was generated for
    pub product_description: String,
    /// Leads in the pass, including errored ones
    pub total_leads: usize,
    /// Classified as Strike
    pub strike: usize,
    /// Classified as Monitor
    pub monitor: usize,
    /// Classified as Disregard
    pub disregard: usize,
    /// Leads that failed validation
    pub errored: usize,
    /// Rounded to two decimal places.
    pub disregard_rate: f64,
    /// Whether the disregard rate crossed the threshold
    pub pivot_triggered: bool,
    /// The segment-pivot lesson, when one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_lesson_id: Option<String>,
    /// Why the pivot lesson could not be written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_error: Option<String>,
    /// One entry per lead
    pub results: Vec<LeadValidationResult>,
}

impl ValidationReport {
    /// Verdicts of the leads that were classified.
    pub fn validated(&self) -> impl Iterator<Item = &LeadVerdict> {
        self.results.iter().filter_map(|r| match r {
            LeadValidationResult::Validated(v) => Some(v),
            LeadValidationResult::Failed { .. } => None,
        })
    }
}

/// Round to two decimal places for reporting.
pub fn round_rate(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}
