//! Lead (prospective target account) domain model.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::evidence::EvidenceSource;
use super::lesson::Lesson;
use super::tech_stack::TechStack;

/// Qualification label assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Strong fit with an urgent trigger
    Strike,
    /// Potential fit, nothing urgent
    Monitor,
    /// Poor fit
    Disregard,
}

impl Classification {
    /// Every classification, best first.
    pub const ALL: [Self; 3] = [Self::Strike, Self::Monitor, Self::Disregard];

    /// Display name, as returned by the classifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strike => "Strike",
            Self::Monitor => "Monitor",
            Self::Disregard => "Disregard",
        }
    }

    /// Exact label match, as stored and as the classifier is asked to answer.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Strike" => Some(Self::Strike),
            "Monitor" => Some(Self::Monitor),
            "Disregard" => Some(Self::Disregard),
            _ => None,
        }
    }

    /// A Disregard counts as a failed lead in pivot aggregation.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Disregard)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospective target company, keyed by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Unique key
    pub domain: String,
    /// Company name
    pub name: String,
    /// Technologies as claimed in the lead record
    pub tech_stack: Vec<String>,
    /// Headcount, when known
    pub employees: Option<u32>,
    /// e.g. "Series B"
    pub funding_stage: Option<String>,
    /// Last written score (0-100)
    pub score: Option<u8>,
    /// Last written classification
    pub classification: Option<Classification>,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Bumped on every write
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// New lead with empty stack and no score.
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            domain: domain.into(),
            name: name.into(),
            tech_stack: Vec::new(),
            employees: None,
            funding_stage: None,
            score: None,
            classification: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the claimed stack.
    pub fn with_tech_stack<I: IntoIterator<Item = S>, S: Into<String>>(mut self, stack: I) -> Self {
        self.tech_stack = stack.into_iter().map(Into::into).collect();
        self
    }

    /// Set the headcount.
    pub fn with_employees(mut self, employees: u32) -> Self {
        self.employees = Some(employees);
        self
    }

    /// Set the funding stage.
    pub fn with_funding_stage(mut self, stage: impl Into<String>) -> Self {
        self.funding_stage = Some(stage.into());
        self
    }

    /// Set the score.
    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    /// Claimed stack in canonical form.
    pub fn claimed_stack(&self) -> TechStack {
        TechStack::from_terms(&self.tech_stack)
    }

    /// Case-insensitive substring match of `token` against any claimed technology.
    pub fn mentions_technology(&self, token: &str) -> bool {
        let needle = token.to_lowercase();
        self.tech_stack
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
    }

    /// Reject blank domains or names and out-of-range scores.
    pub fn validate(&self) -> Result<(), String> {
        if self.domain.trim().is_empty() {
            return Err("Lead domain cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("Lead {} has no name", self.domain));
        }
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        Ok(())
    }
}

/// Scores range over 0-100.
pub fn validate_score(score: u8) -> Result<(), String> {
    if score > 100 {
        return Err(format!("Score {score} out of range (0-100)"));
    }
    Ok(())
}

/// Lead record as written in seed and import files.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    /// Unique key
    pub domain: String,
    /// Company name
    pub name: String,
    /// Claimed technologies
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Headcount
    #[serde(default)]
    pub employees: Option<u32>,
    /// Accepts `funding` as an alias
    #[serde(default, alias = "funding")]
    pub funding_stage: Option<String>,
    /// Initial score (0-100)
    #[serde(default)]
    pub score: Option<u8>,
}

impl From<NewLead> for Lead {
    fn from(record: NewLead) -> Self {
        let mut lead = Self::new(record.domain.trim(), record.name.trim())
            .with_tech_stack(record.tech_stack);
        lead.employees = record.employees;
        lead.funding_stage = record.funding_stage;
        lead.score = record.score;
        lead
    }
}

/// Everything one validation writes for a lead, persisted as a single unit.
#[derive(Debug, Clone)]
pub struct LeadOutcome {
    /// Lead being written
    pub domain: String,
    /// New classification
    pub classification: Classification,
    /// Score overwrite; `None` leaves the stored score untouched
    pub score: Option<u8>,
    /// URL-bearing sources to upsert and link
    pub evidence: Vec<EvidenceSource>,
    /// Lesson recorded on a negative outcome
    pub lesson: Option<Lesson>,
}
