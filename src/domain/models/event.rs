//! Progress events broadcast while the agent works.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lead::Classification;
use super::lesson::LessonType;
use super::strategy::ComposeMode;

/// Event payload. The serialized `type` tag is the wire name from
/// [`EventKind::event_type`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    /// Product description received, truncated
    ProductReceived {
        /// Leading characters of the description
        preview: String,
    },
    /// Market research call started
    MarketResearchStarted,
    /// Market research returned
    MarketResearchDone {
        /// Competitor hits found
        competitors: usize,
        /// Pricing snippets found
        pricing_insights: usize,
        /// Complaint snippets found
        complaints: usize,
    },
    /// A draft strategy was produced
    StrategyGenerated {
        /// Compose or refine
        mode: ComposeMode,
        /// Lessons fed into the prompt
        lessons_used: usize,
        /// Leading characters of the ICP
        icp_preview: String,
    },
    /// A strategy version was persisted
    StrategyStored {
        /// New version
        version: u32,
        /// Version it evolved from
        evolved_from: Option<u32>,
    },
    /// A validation pass started
    ValidationStarted {
        /// Strategy being validated
        version: u32,
        /// Leads in the pass
        total: usize,
    },
    /// One lead is being validated
    LeadValidating {
        /// Lead domain
        domain: String,
        /// Company name
        company: String,
        /// Position in the pass, e.g. "3/10"
        progress: String,
    },
    /// One lead was classified
    LeadValidated {
        /// Lead domain
        domain: String,
        /// Company name
        company: String,
        /// New classification
        classification: Classification,
        /// Lesson recorded for the lead, if any
        lesson_type: Option<LessonType>,
    },
    /// One lead could not be validated
    LeadValidationFailed {
        /// Lead domain
        domain: String,
        /// Company name
        company: String,
        /// Failure message
        error: String,
    },
    /// The disregard rate crossed the pivot threshold
    PivotTriggered {
        /// Strategy that failed
        version: u32,
        /// Share of classified leads marked Disregard
        disregard_rate: f64,
        /// The segment-pivot lesson
        lesson_id: String,
    },
    /// A validation pass finished
    ValidationCompleted {
        /// Strategy validated
        version: u32,
        /// Leads marked Strike
        strike: usize,
        /// Leads marked Monitor
        monitor: usize,
        /// Leads marked Disregard
        disregard: usize,
        /// Leads that failed validation
        errored: usize,
        /// Whether a pivot lesson was written
        pivot_triggered: bool,
    },
    /// A trigger event arrived
    TriggerReceived {
        /// Competitor named by the event
        competitor: String,
        /// Event status
        status: String,
    },
    /// An outreach email was drafted
    OutreachDrafted {
        /// Lead domain
        domain: String,
        /// Email subject
        subject: String,
    },
    /// A trigger event was fully handled
    TriggerHandled {
        /// Strategy current when the event arrived
        version: u32,
        /// Leads that received a draft
        affected_leads: usize,
        /// The trigger lesson, if any lead was affected
        lesson_id: Option<String>,
    },
    /// A stage failed
    AgentError {
        /// Stage name, e.g. "research"
        stage: String,
        /// Error message
        message: String,
    },
}

impl EventKind {
    /// Wire name, e.g. `strategy_stored`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProductReceived { .. } => "product_received",
            Self::MarketResearchStarted => "market_research_started",
            Self::MarketResearchDone { .. } => "market_research_done",
            Self::StrategyGenerated { .. } => "strategy_generated",
            Self::StrategyStored { .. } => "strategy_stored",
            Self::ValidationStarted { .. } => "validation_started",
            Self::LeadValidating { .. } => "lead_validating",
            Self::LeadValidated { .. } => "lead_validated",
            Self::LeadValidationFailed { .. } => "lead_validation_failed",
            Self::PivotTriggered { .. } => "pivot_triggered",
            Self::ValidationCompleted { .. } => "validation_completed",
            Self::TriggerReceived { .. } => "trigger_received",
            Self::OutreachDrafted { .. } => "outreach_drafted",
            Self::TriggerHandled { .. } => "trigger_handled",
            Self::AgentError { .. } => "agent_error",
        }
    }

    /// Error event for `stage`.
    pub fn agent_error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AgentError {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Envelope assigned by the event bus on publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterEvent {
    /// Unique event id
    pub id: Uuid,
    /// Monotonic per bus, starting at 0
    pub sequence: u64,
    /// Publish time
    pub timestamp: DateTime<Utc>,
    /// Payload
    pub kind: EventKind,
}

impl HunterEvent {
    /// Wire name of the payload.
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let kind = EventKind::StrategyStored {
            version: 3,
            evolved_from: Some(2),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], kind.event_type());
        assert_eq!(json["data"]["version"], 3);

        let unit = serde_json::to_value(EventKind::MarketResearchStarted).unwrap();
        assert_eq!(unit["type"], "market_research_started");
    }
}
