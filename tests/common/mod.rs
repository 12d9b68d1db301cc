//! Shared fixtures for integration tests.
//!
//! Builds a fully wired [`Runtime`] over an in-memory migrated SQLite pool
//! with scripted providers in every slot.

#![allow(dead_code)]

use std::sync::Arc;

use recursive_hunter::adapters::mock::{ScriptedEvidence, ScriptedGenerator, StaticResearch};
use recursive_hunter::adapters::sqlite::create_migrated_test_pool;
use recursive_hunter::domain::models::{Config, MarketResearch, NewLead};
use recursive_hunter::infrastructure::setup::{Providers, Runtime};

pub const PRODUCT: &str = "Managed Postgres hosting with zero-downtime migrations";

pub fn strategy_json(icp: &str) -> String {
    serde_json::json!({
        "icp": icp,
        "keywords": ["postgres", "database migration"],
        "competitors": ["Neon", "Supabase"]
    })
    .to_string()
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.providers.timeout_secs = 5;
    config.providers.retry.initial_backoff_ms = 1;
    config.providers.retry.max_backoff_ms = 10;
    config
}

pub struct Scripted {
    pub generator: Arc<ScriptedGenerator>,
    pub evidence: Arc<ScriptedEvidence>,
    pub research: Arc<StaticResearch>,
}

impl Scripted {
    pub fn new(generator: ScriptedGenerator, evidence: ScriptedEvidence) -> Self {
        Self {
            generator: Arc::new(generator),
            evidence: Arc::new(evidence),
            research: Arc::new(StaticResearch::new(MarketResearch::default())),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            research: self.research.clone(),
            generation: self.generator.clone(),
            evidence: self.evidence.clone(),
        }
    }
}

pub async fn runtime(scripted: &Scripted, config: &Config) -> Runtime {
    let pool = create_migrated_test_pool().await.unwrap();
    Runtime::assemble(config, pool, scripted.providers())
}

pub fn lead(domain: &str, name: &str, stack: &[&str], employees: u32) -> NewLead {
    NewLead {
        domain: domain.to_string(),
        name: name.to_string(),
        tech_stack: stack.iter().map(|s| (*s).to_string()).collect(),
        employees: Some(employees),
        funding_stage: Some("Series B".to_string()),
        score: None,
    }
}

pub async fn import(runtime: &Runtime, leads: Vec<NewLead>) {
    let summary = runtime.hunter.import_leads(leads).await.unwrap();
    assert!(summary.skipped.is_empty());
}
