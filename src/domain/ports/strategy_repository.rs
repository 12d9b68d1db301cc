//! Strategy version store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Strategy, StrategyDraft};

/// Repository interface for the versioned strategy lineage.
///
/// Version allocation is the single shared-mutable hotspot of the system:
/// implementations must guarantee that two writers racing on the same
/// `prev_version` never both succeed.
#[async_trait]
pub trait StrategyRepository: Send + Sync {
    /// Persist `draft` as version `prev_version + 1` (or 1), snapshot every
    /// known lead as a target and link `evolved_from`, all atomically.
    ///
    /// Fails with `VersionConflict` when `prev_version` is no longer the latest.
    async fn create_version(
        &self,
        draft: &StrategyDraft,
        product_description: &str,
        prev_version: Option<u32>,
    ) -> DomainResult<Strategy>;

    /// The max-version strategy, if any.
    async fn latest(&self) -> DomainResult<Option<Strategy>>;

    /// Strategy by version.
    async fn get(&self, version: u32) -> DomainResult<Option<Strategy>>;

    /// All strategies, newest first.
    async fn list(&self) -> DomainResult<Vec<Strategy>>;

    /// Number of leads snapshotted as targets of `version`.
    async fn target_count(&self, version: u32) -> DomainResult<u64>;
}
