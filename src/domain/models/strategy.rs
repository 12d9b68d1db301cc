//! Strategy domain model.
//!
//! A strategy is one immutable version of the Ideal Customer Profile (ICP).
//! Versions form a linear chain through `evolved_from`; the current strategy is
//! always the one with the highest version number.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A freshly generated ICP proposal, not yet assigned a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDraft {
    /// One-paragraph description of the ideal customer
    pub icp: String,
    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Competitor names
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl StrategyDraft {
    /// Draft with no keywords or competitors.
    pub fn new(icp: impl Into<String>) -> Self {
        Self {
            icp: icp.into(),
            keywords: Vec::new(),
            competitors: Vec::new(),
        }
    }

    /// Replace the keywords.
    pub fn with_keywords<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keywords: I) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the competitor list.
    pub fn with_competitors<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        competitors: I,
    ) -> Self {
        self.competitors = competitors.into_iter().map(Into::into).collect();
        self
    }

    /// Trim entries and drop blanks and case-insensitive duplicates,
    /// keeping the first spelling seen.
    pub fn normalized(self) -> Self {
        Self {
            icp: self.icp.trim().to_string(),
            keywords: dedupe(self.keywords),
            competitors: dedupe(self.competitors),
        }
    }

    /// Reject an empty ICP.
    pub fn validate(&self) -> Result<(), String> {
        if self.icp.trim().is_empty() {
            return Err("ICP cannot be empty".to_string());
        }
        Ok(())
    }
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

/// Which composer branch produced a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeMode {
    /// No lessons existed; the ICP was generated from research alone
    Compose,
    /// Lessons existed; every one of them was fed into the prompt
    Refine,
}

impl ComposeMode {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::Refine => "refine",
        }
    }
}

/// A persisted, versioned strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Globally unique, strictly increasing version (starts at 1)
    pub version: u32,
    /// Product description the strategy was generated for
    pub product_description: String,
    /// Ideal customer profile
    pub icp: String,
    /// Search keywords
    pub keywords: Vec<String>,
    /// Competitor names
    pub competitors: Vec<String>,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// The single prior version this one evolved from
    pub evolved_from: Option<u32>,
}

impl Strategy {
    /// Build a strategy from a normalized draft.
    pub fn from_draft(
        version: u32,
        product_description: impl Into<String>,
        draft: StrategyDraft,
        evolved_from: Option<u32>,
    ) -> Self {
        Self {
            version,
            product_description: product_description.into(),
            icp: draft.icp,
            keywords: draft.keywords,
            competitors: draft.competitors,
            created_at: Utc::now().trunc_subsecs(6),
            evolved_from,
        }
    }

    /// ICP cut to `max_chars`.
    pub fn icp_preview(&self, max_chars: usize) -> String {
        preview(&self.icp, max_chars)
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with "...".
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
