//! Evidence gathered while fact-checking leads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tech_stack::TechStack;

/// A web source returned by the evidence provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSource {
    /// Empty when the provider returned none
    #[serde(default)]
    pub url: String,
    /// Excerpt from the source
    #[serde(default)]
    pub summary: String,
}

impl EvidenceSource {
    /// Source with `url` and `summary`.
    pub fn new(url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            summary: summary.into(),
        }
    }

    /// Sources without a URL are never persisted.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// A persisted evidence node, deduplicated by `source_url` across all leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique across all evidence
    pub source_url: String,
    /// Excerpt from the source
    pub summary: String,
    /// When the source was last fetched
    pub retrieved_at: DateTime<Utc>,
}

/// Result of checking a lead's claimed stack against the web.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCheck {
    /// Technologies discovered in the evidence, canonicalized
    pub actual_tech: TechStack,
    /// Sources consulted
    pub sources: Vec<EvidenceSource>,
    /// Whether the claimed stack contradicts the evidence
    pub mismatch: bool,
    /// Why, when `mismatch` is set
    pub mismatch_details: Option<String>,
}
