//! Lesson domain model.
//!
//! Lessons are append-only records of negative outcomes or corrective signals.
//! They are attached to exactly one lead or one strategy and are never mutated.
//! Their timestamp order decides the order in which they are fed back into
//! strategy refinement.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a lesson was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonType {
    /// Claimed stack contradicted by web evidence
    TechStackMismatch,
    /// Company below the size the strategy targets
    CompanyTooSmall,
    /// Company locked into a competitor contract
    ContractLockIn,
    /// The strategy's disregard rate crossed the threshold
    SegmentPivot,
    /// A trigger event produced outreach
    TriggerPivot,
    /// Generic negative classification with no more specific cause
    Disregard,
}

impl LessonType {
    /// Stored name, e.g. `TECH_STACK_MISMATCH`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TechStackMismatch => "TechStackMismatch",
            Self::CompanyTooSmall => "CompanyTooSmall",
            Self::ContractLockIn => "ContractLockIn",
            Self::SegmentPivot => "SegmentPivot",
            Self::TriggerPivot => "TriggerPivot",
            Self::Disregard => "Disregard",
        }
    }

    /// Parse a stored name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TechStackMismatch" => Some(Self::TechStackMismatch),
            "CompanyTooSmall" => Some(Self::CompanyTooSmall),
            "ContractLockIn" => Some(Self::ContractLockIn),
            "SegmentPivot" => Some(Self::SegmentPivot),
            "TriggerPivot" => Some(Self::TriggerPivot),
            "Disregard" => Some(Self::Disregard),
            _ => None,
        }
    }

    /// Strategy-level lessons are written against a strategy, not a lead.
    pub fn is_strategy_level(&self) -> bool {
        matches!(self, Self::SegmentPivot | Self::TriggerPivot)
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a lesson is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum LessonSubject {
    /// Keyed by lead domain
    Lead(String),
    /// Keyed by strategy version
    Strategy(u32),
}

impl fmt::Display for LessonSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lead(domain) => write!(f, "lead {domain}"),
            Self::Strategy(version) => write!(f, "strategy v{version}"),
        }
    }
}

/// Something learned from a failed lead, a pivot or a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// `les-` followed by a UUID
    pub lesson_id: String,
    /// Reason the lesson exists
    pub lesson_type: LessonType,
    /// Free text fed back into refinement prompts
    pub details: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// What the lesson is attached to
    pub subject: LessonSubject,
}

impl Lesson {
    /// New lesson with a fresh id and the current time.
    pub fn new(lesson_type: LessonType, details: impl Into<String>, subject: LessonSubject) -> Self {
        Self {
            lesson_id: format!("les-{}", Uuid::new_v4().simple()),
            lesson_type,
            details: details.into(),
            timestamp: Utc::now().trunc_subsecs(6),
            subject,
        }
    }

    /// Lesson attached to a lead.
    pub fn for_lead(domain: impl Into<String>, lesson_type: LessonType, details: impl Into<String>) -> Self {
        Self::new(lesson_type, details, LessonSubject::Lead(domain.into()))
    }

    /// Lesson attached to a strategy version.
    pub fn for_strategy(version: u32, lesson_type: LessonType, details: impl Into<String>) -> Self {
        Self::new(lesson_type, details, LessonSubject::Strategy(version))
    }

    /// Reject empty details.
    pub fn validate(&self) -> Result<(), String> {
        if self.details.trim().is_empty() {
            return Err(format!("Lesson {} has empty details", self.lesson_id));
        }
        Ok(())
    }

    /// Single prompt line used when feeding lessons back into refinement.
    pub fn as_prompt_line(&self) -> String {
        format!("- [{}] {}", self.lesson_type, self.details)
    }
}
