//! Decoding of free-text generation output into structured values.

use serde::de::DeserializeOwned;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Classification, StrategyDraft};

/// Strip a markdown code fence (```json or bare ```) surrounding the payload.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();

    let inner = if let Some((_, rest)) = trimmed.split_once("```json") {
        rest
    } else if let Some((_, rest)) = trimmed.split_once("```") {
        rest
    } else {
        return trimmed;
    };

    inner.split_once("```").map_or(inner, |(body, _)| body).trim()
}

/// Extract the JSON payload from a model response.
///
/// Fences are removed first; if the remainder still has prose around it, the
/// outermost `{...}` span is taken.
pub fn extract_json_from_response(response: &str) -> String {
    let unfenced = strip_code_fence(response);

    if unfenced.starts_with('{') || unfenced.starts_with('[') {
        return unfenced.to_string();
    }

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if end > start => unfenced[start..=end].to_string(),
        _ => unfenced.to_string(),
    }
}

/// Decode a JSON value out of a model response, failing with
/// `MalformedResponse` naming what was expected.
pub fn decode_json<T: DeserializeOwned>(response: &str, expected: &str) -> DomainResult<T> {
    let json = extract_json_from_response(response);
    serde_json::from_str(&json).map_err(|e| {
        DomainError::MalformedResponse(format!(
            "expected {expected}: {e}. Response: {}",
            crate::domain::models::preview(response.trim(), 200)
        ))
    })
}

/// Decode a strategy draft, rejecting drafts without an ICP.
pub fn decode_strategy_draft(response: &str) -> DomainResult<StrategyDraft> {
    let draft: StrategyDraft = decode_json(response, "strategy JSON {icp, keywords, competitors}")?;
    let draft = draft.normalized();
    draft.validate().map_err(DomainError::MalformedResponse)?;
    Ok(draft)
}

/// Map raw classifier output to a label.
///
/// The first word is tried as an exact label. Failing that, the text is
/// searched case-insensitively; exactly one distinct label found wins. No
/// label, or conflicting labels, fall back to `Monitor`.
pub fn decode_classification(raw: &str) -> Classification {
    let first = raw
        .split_whitespace()
        .next()
        .map(|token| token.trim_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '"' | '\'')))
        .unwrap_or_default();

    if let Some(label) = Classification::from_str(first) {
        return label;
    }

    let lowered = raw.to_lowercase();
    let mut found = Classification::ALL
        .iter()
        .filter(|label| lowered.contains(&label.as_str().to_lowercase()));

    match (found.next(), found.next()) {
        (Some(label), None) => *label,
        _ => Classification::Monitor,
    }
}
