//! Canonical technology vocabulary.
//!
//! Claimed stacks (from lead records) and discovered stacks (from web evidence)
//! are both reduced to lowercase canonical tokens before they are compared, with
//! known synonyms collapsed to a single token each.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical technology tokens recognised in free text.
pub const TECH_VOCABULARY: &[&str] = &[
    "python", "go", "rust", "java", "ruby", "php", "typescript", "javascript", "c#", ".net",
    "elixir", "scala", "kotlin", "swift", "postgres", "mysql", "mongodb", "redis",
    "elasticsearch", "dynamodb", "cockroachdb", "oracle", "sql server", "sqlite", "cassandra",
    "aws", "gcp", "azure", "digitalocean", "heroku", "fly.io", "render", "vercel", "cloudflare",
    "on-prem", "kubernetes", "docker", "nomad", "terraform", "ansible", "react", "vue",
    "angular", "next.js", "django", "fastapi", "rails", "spring", "express", "flask",
];

/// Synonym → canonical token.
const SYNONYMS: &[(&str, &str)] = &[
    ("postgresql", "postgres"),
    ("golang", "go"),
    ("google cloud platform", "gcp"),
    ("google cloud", "gcp"),
    ("amazon web services", "aws"),
    ("oracle db", "oracle"),
    ("oracle database", "oracle"),
    ("mongo", "mongodb"),
    ("microsoft sql server", "sql server"),
    ("mssql", "sql server"),
    ("k8s", "kubernetes"),
    ("nextjs", "next.js"),
    ("on-premise", "on-prem"),
    ("on-premises", "on-prem"),
];

/// The subset of the vocabulary treated as database technology.
pub const DATABASE_TECHNOLOGIES: &[&str] = &[
    "postgres", "mysql", "mongodb", "redis", "dynamodb", "cockroachdb", "oracle", "sql server",
    "cassandra", "elasticsearch", "sqlite",
];

/// Reduce a single technology term to its canonical token.
pub fn canonicalize(term: &str) -> String {
    let lowered = term.trim().to_lowercase();
    SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map_or(lowered, |(_, canonical)| (*canonical).to_string())
}

/// True for tokens naming a database.
pub fn is_database(token: &str) -> bool {
    DATABASE_TECHNOLOGIES.contains(&token)
}

/// A normalized set of technology tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechStack(BTreeSet<String>);

impl TechStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from claimed terms, canonicalizing each one.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            terms
                .into_iter()
                .map(|t| canonicalize(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Pull known technology mentions out of a block of text.
    pub fn extract_from_text(text: &str) -> Self {
        let haystack = text.to_lowercase();
        let mut found = BTreeSet::new();

        for term in TECH_VOCABULARY {
            if contains_term(&haystack, term) {
                found.insert((*term).to_string());
            }
        }
        for (alias, canonical) in SYNONYMS {
            if contains_term(&haystack, alias) {
                found.insert((*canonical).to_string());
            }
        }

        Self(found)
    }

    /// True when no token is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Exact match on a canonical token.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Only the database technologies in this stack.
    pub fn databases(&self) -> Self {
        Self(self.0.iter().filter(|t| is_database(t)).cloned().collect())
    }

    /// Tokens present in both stacks.
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// True when the stacks share no token.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Tokens in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl fmt::Display for TechStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.0.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        write!(f, "{joined}")
    }
}

impl<S: AsRef<str>> FromIterator<S> for TechStack {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_terms(iter)
    }
}

/// Substring match that refuses to match inside a larger word
/// ("go" must not match "google", "java" must not match "javascript").
fn contains_term(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
