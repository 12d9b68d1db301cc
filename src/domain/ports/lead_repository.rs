//! Lead registry port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Classification, Evidence, Lead, LeadOutcome};

/// Repository interface for leads and the evidence linked to them.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert a new lead. Returns false when the domain already exists.
    async fn insert(&self, lead: &Lead) -> DomainResult<bool>;

    /// Lead by domain.
    async fn get(&self, domain: &str) -> DomainResult<Option<Lead>>;

    /// All leads ordered by domain.
    async fn list(&self) -> DomainResult<Vec<Lead>>;

    /// Number of stored leads.
    async fn count(&self) -> DomainResult<u64>;

    /// Leads targeted by `version`, ordered by domain.
    async fn leads_for(&self, version: u32) -> DomainResult<Vec<Lead>>;

    /// Overwrite the score. Fails with `UnknownLead` if the domain is absent.
    async fn update_score(&self, domain: &str, score: u8) -> DomainResult<()>;

    /// Overwrite the classification. Fails with `UnknownLead` if the domain is absent.
    async fn update_classification(
        &self,
        domain: &str,
        classification: Classification,
    ) -> DomainResult<()>;

    /// Write classification, score, evidence links and lesson as one unit.
    async fn record_outcome(&self, outcome: &LeadOutcome) -> DomainResult<()>;

    /// Evidence linked to a lead, oldest first.
    async fn evidence_for(&self, domain: &str) -> DomainResult<Vec<Evidence>>;

    /// Domains of every lead linked to the evidence at `source_url`.
    async fn leads_citing(&self, source_url: &str) -> DomainResult<Vec<String>>;
}
