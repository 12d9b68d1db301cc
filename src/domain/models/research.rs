//! Market research gathered before composing a strategy.

use serde::{Deserialize, Serialize};

/// One competitor search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorInsight {
    /// Competitor name or page title
    pub name: String,
    /// Source URL
    #[serde(default)]
    pub url: String,
    /// Search snippet
    #[serde(default)]
    pub snippet: String,
}

/// Output of `ResearchProvider::research`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketResearch {
    /// Competitor hits
    #[serde(default)]
    pub competitors: Vec<CompetitorInsight>,
    /// Snippets about competitor pricing
    #[serde(default)]
    pub pricing_insights: Vec<String>,
    /// Snippets about customer complaints
    #[serde(default)]
    pub complaints: Vec<String>,
}

impl MarketResearch {
    /// True when research found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty() && self.pricing_insights.is_empty() && self.complaints.is_empty()
    }

    /// Compact JSON used inside generation prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
