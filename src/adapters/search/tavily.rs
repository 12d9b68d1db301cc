//! Tavily web search client.
//!
//! Serves both market research and per-company tech-stack fact checks.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::adapters::http::{build_client, read_body, ApiError, OutboundPolicy};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CompetitorInsight, EvidenceSource, FactCheck, MarketResearch, RetryConfig, SearchConfig,
    TechStack,
};
use crate::domain::ports::{EvidenceProvider, ResearchProvider};
use crate::services::mismatch_policy;

const PROVIDER: &str = "tavily";
const SNIPPET_CHARS: usize = 300;

/// Search depth requested from Tavily.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Cheaper, used for fact checks
    Basic,
    /// Used for market research
    Advanced,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: SearchDepth,
    max_results: u32,
}

/// One search result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Source URL
    #[serde(default)]
    pub url: String,
    /// Page content excerpt
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// Query used to fact-check a company's stack.
pub fn fact_check_query(company: &str, year: i32) -> String {
    format!("{company} engineering tech stack infrastructure {year}")
}

/// Build a fact check from raw search hits.
pub fn fact_check_from_hits(claimed_stack: &[String], hits: &[SearchHit]) -> FactCheck {
    let all_text = hits
        .iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let actual_tech = TechStack::extract_from_text(&all_text);
    let verdict = mismatch_policy::evaluate_claims(claimed_stack, &actual_tech);

    FactCheck {
        actual_tech,
        sources: hits
            .iter()
            .map(|h| EvidenceSource::new(&h.url, snippet(&h.content)))
            .collect(),
        mismatch: verdict.mismatch,
        mismatch_details: verdict.details,
    }
}

/// Tavily web search client, used for both research and fact checks.
pub struct TavilyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: u32,
    policy: OutboundPolicy,
}

impl TavilyClient {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: &SearchConfig, retry: RetryConfig, timeout: Duration) -> Result<Self, ApiError> {
        let api_key = config.api_key.clone().ok_or(ApiError::MissingApiKey)?;
        Ok(Self {
            http: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results: config.max_results,
            policy: OutboundPolicy::new(config.requests_per_second, retry),
        })
    }

    async fn send(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchHit>, ApiError> {
        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let body = read_body(response).await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(parsed.results)
    }

    /// Run one search through the rate limiter and retry policy.
    pub async fn search(&self, query: &str, depth: SearchDepth, max_results: u32) -> DomainResult<Vec<SearchHit>> {
        let request = SearchRequest {
            query,
            search_depth: depth,
            max_results,
        };
        let hits = self
            .policy
            .run(|| self.send(&request))
            .await
            .map_err(|e| e.into_domain(PROVIDER))?;
        debug!(query, hits = hits.len(), "search complete");
        Ok(hits)
    }
}

#[async_trait]
impl ResearchProvider for TavilyClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, description))]
    async fn research(&self, description: &str) -> DomainResult<MarketResearch> {
        let year = Utc::now().year();
        let competitors_query = format!("competitors to: {description}");
        let pricing_query = format!("{description} pricing comparison {year}");
        let complaints_query = format!("{description} complaints problems switching {year}");

        let (competitors, pricing, complaints) = tokio::try_join!(
            self.search(&competitors_query, SearchDepth::Advanced, self.max_results),
            self.search(&pricing_query, SearchDepth::Basic, 3),
            self.search(&complaints_query, SearchDepth::Basic, 3),
        )?;

        Ok(MarketResearch {
            competitors: competitors
                .into_iter()
                .map(|h| CompetitorInsight {
                    name: h.title,
                    url: h.url,
                    snippet: snippet(&h.content),
                })
                .collect(),
            pricing_insights: pricing.iter().map(|h| snippet(&h.content)).collect(),
            complaints: complaints.iter().map(|h| snippet(&h.content)).collect(),
        })
    }
}

#[async_trait]
impl EvidenceProvider for TavilyClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self, claimed_stack))]
    async fn fact_check(&self, company: &str, claimed_stack: &[String]) -> DomainResult<FactCheck> {
        let query = fact_check_query(company, Utc::now().year());
        let hits = self.search(&query, SearchDepth::Advanced, self.max_results).await?;
        Ok(fact_check_from_hits(claimed_stack, &hits))
    }
}
