//! External collaborator ports.
//!
//! The core never talks HTTP itself; everything it needs from the outside
//! world (market research, text generation, fact checking, outreach drafting)
//! comes through these traits. Every call is bounded by a timeout at the call
//! site, so implementations need not enforce one themselves.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{FactCheck, Lead, MarketResearch, OutreachDraft, Strategy, TriggerEvent};

/// Market research for a product description.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Competitors, pricing and complaints for the product's market.
    async fn research(&self, description: &str) -> DomainResult<MarketResearch>;
}

/// Free-text generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Returns the decoded text of the model's reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> DomainResult<String>;
}

/// Fact checks a company's claimed stack against external evidence.
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Search for evidence of what `company` actually runs.
    async fn fact_check(&self, company: &str, claimed_stack: &[String]) -> DomainResult<FactCheck>;
}

/// Drafts a personalised outreach email for one lead.
#[async_trait]
pub trait OutreachDrafter: Send + Sync {
    /// Provider name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Draft an email to `lead` about `event`, in the voice of `strategy`.
    async fn draft(
        &self,
        lead: &Lead,
        event: &TriggerEvent,
        strategy: &Strategy,
    ) -> DomainResult<OutreachDraft>;
}
