//! Strategy composer.
//!
//! Turns a product description plus market research into an ICP draft. When
//! any lesson exists the composer must refine, feeding every lesson back in
//! timestamp order; `compose` is only reachable with an empty lesson log.

use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, instrument};

use super::provider_guard::with_timeout;
use super::response_decoder::decode_strategy_draft;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ComposeMode, Lesson, MarketResearch, StrategyDraft};
use crate::domain::ports::GenerationProvider;

/// Token budget for a strategy draft.
pub const STRATEGY_MAX_TOKENS: u32 = 1000;

/// System prompt for a first strategy.
pub const COMPOSE_SYSTEM_PROMPT: &str = "\
You are an expert B2B sales strategist. Given a product description and market \
research data, produce a precise Ideal Customer Profile (ICP) and targeting strategy.

Respond ONLY with valid JSON in this exact schema:
{
  \"icp\": \"<one-paragraph description of ideal customer>\",
  \"keywords\": [\"<search keyword>\", ...],
  \"competitors\": [\"<competitor name>\", ...]
}
Output the JSON object alone, without explanation or markdown.";

/// System prompt for refining with lessons.
pub const REFINE_SYSTEM_PROMPT: &str = "\
You are an expert B2B sales strategist improving your targeting based on past mistakes.

You will receive:
1. A product description
2. Market research
3. Lessons from previous failed lead validations, oldest first

Use the lessons to REFINE and NARROW the ICP. Avoid repeating past mistakes.

Respond ONLY with valid JSON:
{
  \"icp\": \"<improved one-paragraph ICP>\",
  \"keywords\": [\"<refined keyword>\", ...],
  \"competitors\": [\"<competitor name>\", ...]
}
Output the JSON object alone, without explanation or markdown.";

/// User prompt for a first strategy.
pub fn build_compose_prompt(description: &str, research: &MarketResearch) -> String {
    format!(
        "Product: {description}\n\nMarket research:\n{}",
        research.to_prompt_json()
    )
}

/// `lessons` must already be in timestamp order.
pub fn build_refine_prompt(description: &str, research: &MarketResearch, lessons: &[Lesson]) -> String {
    let lessons_text = lessons
        .iter()
        .map(Lesson::as_prompt_line)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\nLessons from previous rounds:\n{lessons_text}",
        build_compose_prompt(description, research)
    )
}

/// Turns research, and lessons when present, into a strategy draft.
pub struct StrategyComposer {
    generator: Arc<dyn GenerationProvider>,
    timeout: Duration,
}

impl StrategyComposer {
    /// Composer bounding each call by `timeout`.
    pub fn new(generator: Arc<dyn GenerationProvider>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// First strategy for a product; no lessons exist yet.
    #[instrument(skip(self, research), fields(description_len = description.len()))]
    pub async fn compose(
        &self,
        description: &str,
        research: &MarketResearch,
    ) -> DomainResult<StrategyDraft> {
        let prompt = build_compose_prompt(description, research);
        self.generate(COMPOSE_SYSTEM_PROMPT, &prompt).await
    }

    /// Evolve the strategy using every lesson, oldest first.
    #[instrument(skip(self, research, lessons), fields(lessons = lessons.len()))]
    pub async fn refine(
        &self,
        description: &str,
        research: &MarketResearch,
        lessons: &[Lesson],
    ) -> DomainResult<StrategyDraft> {
        if lessons.is_empty() {
            return Err(DomainError::ValidationFailed(
                "refine requires at least one lesson".to_string(),
            ));
        }

        let mut ordered = lessons.to_vec();
        ordered.sort_by_key(|l| l.timestamp);

        let prompt = build_refine_prompt(description, research, &ordered);
        self.generate(REFINE_SYSTEM_PROMPT, &prompt).await
    }

    /// Pick the branch from the lesson log: any lesson forces `refine`.
    pub async fn draft(
        &self,
        description: &str,
        research: &MarketResearch,
        lessons: &[Lesson],
    ) -> DomainResult<(ComposeMode, StrategyDraft)> {
        if lessons.is_empty() {
            Ok((ComposeMode::Compose, self.compose(description, research).await?))
        } else {
            Ok((ComposeMode::Refine, self.refine(description, research, lessons).await?))
        }
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> DomainResult<StrategyDraft> {
        let raw = with_timeout(
            self.generator.name(),
            self.timeout,
            self.generator.complete(system_prompt, user_prompt, STRATEGY_MAX_TOKENS),
        )
        .await?;

        let draft = decode_strategy_draft(&raw)?;
        debug!(keywords = draft.keywords.len(), competitors = draft.competitors.len(), "decoded strategy draft");
        Ok(draft)
    }
}
