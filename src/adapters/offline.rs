//! Deterministic providers for `providers.mode = offline`.
//!
//! No network access. Research comes back empty, fact checks find nothing,
//! and generation answers each known prompt shape with a fixed rule so the
//! whole loop can be exercised locally.

use async_trait::async_trait;
use serde_json::json;

use super::mock::{ScriptedEvidence, StaticResearch};
use crate::domain::errors::DomainResult;
use crate::domain::models::MarketResearch;
use crate::domain::ports::GenerationProvider;

/// Deterministic generator used when no API keys are configured.
pub struct OfflineGenerator;

impl OfflineGenerator {
    fn field<'a>(prompt: &'a str, label: &str) -> &'a str {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix(label))
            .map_or("", str::trim)
    }

    fn strategy(prompt: &str) -> String {
        let product = Self::field(prompt, "Product:");
        let refined = prompt.contains("Lessons from previous rounds:");
        let icp = if refined {
            format!("Established mid-size companies that need {product}, excluding segments that failed earlier validation")
        } else {
            format!("Growing B2B software companies that need {product}")
        };
        json!({ "icp": icp, "keywords": [product], "competitors": [] }).to_string()
    }

    fn classify(prompt: &str) -> &'static str {
        let trigger = Self::field(prompt, "Trigger Events:");
        if trigger.starts_with("Tech stack mismatch detected") {
            "Disregard"
        } else if trigger.starts_with("Recent web evidence") {
            "Strike"
        } else {
            "Monitor"
        }
    }

    fn outreach() -> String {
        json!({
            "subject": "Following up on today's incident",
            "body": "We saw the news and wanted to offer help with a migration plan if it is useful."
        })
        .to_string()
    }
}

#[async_trait]
impl GenerationProvider for OfflineGenerator {
    fn name(&self) -> &'static str {
        "offline-generation"
    }

    async fn complete(&self, _system_prompt: &str, user_prompt: &str, _max_tokens: u32) -> DomainResult<String> {
        let reply = if user_prompt.starts_with("Product/Service Description:") {
            Self::classify(user_prompt).to_string()
        } else if user_prompt.starts_with("Trigger event:") {
            Self::outreach()
        } else {
            Self::strategy(user_prompt)
        };
        Ok(reply)
    }
}

/// Research provider returning empty research.
pub fn offline_research() -> StaticResearch {
    StaticResearch::new(MarketResearch::default())
}

/// Evidence provider that finds nothing.
pub fn offline_evidence() -> ScriptedEvidence {
    ScriptedEvidence::new()
}
