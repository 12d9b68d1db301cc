//! Tech-stack mismatch policy.
//!
//! Decides whether the technologies a lead claims contradict what web
//! evidence shows. Two tiers, checked in order:
//!
//! 1. Both sides name at least one database and the database subsets are
//!    disjoint. Database choice is the strongest signal, so this wins even
//!    when other technologies overlap.
//! 2. Evidence found something, and nothing it found appears in the claim.
//!
//! Anything else is not a mismatch. Empty evidence never produces one.

use serde::{Deserialize, Serialize};

use crate::domain::models::TechStack;

/// Which rule produced a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchTier {
    /// A claimed database is contradicted by a different discovered one
    Database,
    /// No claimed technology appears in the evidence
    General,
}

/// Outcome of comparing claimed and discovered stacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchVerdict {
    /// True when the claim is contradicted
    pub mismatch: bool,
    /// Rule that fired
    pub tier: Option<MismatchTier>,
    /// Human-readable explanation, stored as lesson details
    pub details: Option<String>,
}

impl MismatchVerdict {
    fn none() -> Self {
        Self {
            mismatch: false,
            tier: None,
            details: None,
        }
    }

    fn found(tier: MismatchTier, details: String) -> Self {
        Self {
            mismatch: true,
            tier: Some(tier),
            details: Some(details),
        }
    }
}

/// Pure decision function; both inputs must already be canonicalized.
pub fn evaluate(claimed: &TechStack, discovered: &TechStack) -> MismatchVerdict {
    let claimed_dbs = claimed.databases();
    let discovered_dbs = discovered.databases();

    if !claimed_dbs.is_empty() && !discovered_dbs.is_empty() && claimed_dbs.is_disjoint(&discovered_dbs) {
        return MismatchVerdict::found(
            MismatchTier::Database,
            format!("Claimed DB: {claimed_dbs}, but web evidence shows: {discovered_dbs}"),
        );
    }

    if !discovered.is_empty() && claimed.intersection(discovered).is_empty() {
        return MismatchVerdict::found(
            MismatchTier::General,
            format!(
                "None of the claimed stack [{claimed}] found in web results. Found instead: [{discovered}]"
            ),
        );
    }

    MismatchVerdict::none()
}

/// Convenience wrapper for raw claimed terms.
pub fn evaluate_claims(claimed: &[String], discovered: &TechStack) -> MismatchVerdict {
    evaluate(&TechStack::from_terms(claimed), discovered)
}
