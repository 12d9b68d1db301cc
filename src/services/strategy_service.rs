//! Strategy generation pipeline: research, compose or refine, store.

use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, instrument, warn};

use super::provider_guard::with_timeout;
use super::strategy_composer::StrategyComposer;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    preview, ComposeMode, EventKind, MarketResearch, RetryConfig, Strategy, StrategyDraft,
};
use crate::domain::ports::{EventSink, LessonRepository, ResearchProvider, StrategyRepository};

/// Result of one generation step.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StrategyGeneration {
    /// The stored strategy
    pub strategy: Strategy,
    /// Research the draft was based on
    pub research: MarketResearch,
    /// Lessons fed into the prompt
    pub lessons_used: usize,
    /// Compose or refine
    pub mode: ComposeMode,
}

impl StrategyGeneration {
    /// Version of the stored strategy.
    pub fn version(&self) -> u32 {
        self.strategy.version
    }

    /// Version the stored strategy evolved from.
    pub fn evolved_from(&self) -> Option<u32> {
        self.strategy.evolved_from
    }
}

/// Researches, composes or refines, and stores strategy versions.
pub struct StrategyService {
    research: Arc<dyn ResearchProvider>,
    composer: StrategyComposer,
    strategies: Arc<dyn StrategyRepository>,
    lessons: Arc<dyn LessonRepository>,
    events: Arc<dyn EventSink>,
    timeout: Duration,
    retry: RetryConfig,
}

impl StrategyService {
    /// Service over the given providers and repositories.
    pub fn new(
        research: Arc<dyn ResearchProvider>,
        composer: StrategyComposer,
        strategies: Arc<dyn StrategyRepository>,
        lessons: Arc<dyn LessonRepository>,
        events: Arc<dyn EventSink>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Self {
        Self {
            research,
            composer,
            strategies,
            lessons,
            events,
            timeout,
            retry,
        }
    }

    /// Research the market for a product.
    pub async fn research(&self, description: &str) -> DomainResult<MarketResearch> {
        self.events.publish(EventKind::MarketResearchStarted);

        let research = with_timeout(
            self.research.name(),
            self.timeout,
            self.research.research(description),
        )
        .await?;

        self.events.publish(EventKind::MarketResearchDone {
            competitors: research.competitors.len(),
            pricing_insights: research.pricing_insights.len(),
            complaints: research.complaints.len(),
        });
        Ok(research)
    }

    /// Full step for a new product description.
    #[instrument(skip(self, description), fields(description_len = description.len()))]
    pub async fn generate(&self, description: &str) -> DomainResult<StrategyGeneration> {
        self.events.publish(EventKind::ProductReceived {
            preview: preview(description, 200),
        });

        let research = self.research(description).await?;
        self.evolve(description, research).await
    }

    /// Compose or refine against already gathered research, then store.
    pub async fn evolve(
        &self,
        description: &str,
        research: MarketResearch,
    ) -> DomainResult<StrategyGeneration> {
        let lessons = self.lessons.all_chronological().await?;
        let (mode, draft) = self.composer.draft(description, &research, &lessons).await?;

        self.events.publish(EventKind::StrategyGenerated {
            mode,
            lessons_used: lessons.len(),
            icp_preview: preview(&draft.icp, 150),
        });

        let strategy = self.store(&draft, description).await?;

        self.events.publish(EventKind::StrategyStored {
            version: strategy.version,
            evolved_from: strategy.evolved_from,
        });
        info!(
            version = strategy.version,
            mode = mode.as_str(),
            lessons_used = lessons.len(),
            "strategy generated"
        );

        Ok(StrategyGeneration {
            strategy,
            research,
            lessons_used: lessons.len(),
            mode,
        })
    }

    /// Store a draft on top of whatever is latest, re-reading `latest()` and
    /// backing off after each version conflict.
    pub async fn store(&self, draft: &StrategyDraft, description: &str) -> DomainResult<Strategy> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        let max_retries = self.retry.max_retries;
        let mut attempt = 0u32;

        retry(policy, || {
            attempt += 1;
            let attempt = attempt;
            async move {
                let prev = self.strategies.latest().await?.map(|s| s.version);
                match self.strategies.create_version(draft, description, prev).await {
                    Ok(strategy) => Ok(strategy),
                    Err(e) if e.is_retryable() && attempt <= max_retries => {
                        warn!(attempt, error = %e, "retrying strategy store");
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }

    /// Latest strategy, or `NoStrategy`.
    pub async fn latest(&self) -> DomainResult<Strategy> {
        self.strategies.latest().await?.ok_or(DomainError::NoStrategy)
    }

    /// Strategy `version`, or `UnknownStrategy`.
    pub async fn get(&self, version: u32) -> DomainResult<Strategy> {
        self.strategies
            .get(version)
            .await?
            .ok_or(DomainError::UnknownStrategy(version))
    }

    /// All strategies, newest first.
    pub async fn list(&self) -> DomainResult<Vec<Strategy>> {
        self.strategies.list().await
    }
}
