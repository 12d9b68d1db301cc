//! External market trigger events and the outreach drafted in response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An external market event, e.g. `{status: "price_hike", competitor: "DigitalOcean"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Event status, e.g. "outage"
    pub status: String,
    /// Competitor the event concerns
    pub competitor: String,
    /// Any extra fields the event source attached
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerEvent {
    /// Event with no extra fields.
    pub fn new(status: impl Into<String>, competitor: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            competitor: competitor.into(),
            extra: Map::new(),
        }
    }

    /// Reject blank competitors or statuses.
    pub fn validate(&self) -> Result<(), String> {
        if self.competitor.trim().is_empty() {
            return Err("Trigger competitor cannot be empty".to_string());
        }
        if self.status.trim().is_empty() {
            return Err("Trigger status cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Subject/body pair returned by the drafting provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachDraft {
    /// Email subject line
    #[serde(default)]
    pub subject: String,
    /// Email body
    #[serde(default)]
    pub body: String,
}

/// A drafted email addressed to one affected lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachEmail {
    /// Company name
    pub company: String,
    /// Lead domain
    pub domain: String,
    /// Email subject line
    pub subject: String,
    /// Email body
    pub body: String,
}

/// Outcome of handling one trigger event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerOutcome {
    /// Strategy current when the event arrived
    pub strategy_version: u32,
    /// Competitor named by the event
    pub competitor: String,
    /// Event status
    pub status: String,
    /// Leads that received a draft
    pub affected_leads: usize,
    /// True when no lead mentioned the competitor and every lead was targeted
    pub broadcast: bool,
    /// One per affected lead, in lead order
    pub emails: Vec<OutreachEmail>,
    /// The trigger lesson; `None` when nothing was drafted
    pub lesson_id: Option<String>,
}
