//! Project initialization and runtime wiring
//!
//! Handles:
//! - `.hunter/` directory and default config file creation
//! - Database creation, migrations and administrative reset
//! - Bundled sample lead seeding
//! - Assembling repositories, providers and services into a [`Runtime`]

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::config::loader::{GENERATION_KEY_ENV, PROJECT_DIR, SEARCH_KEY_ENV};
use crate::adapters::generation::PioneerClient;
use crate::adapters::offline::{offline_evidence, offline_research, OfflineGenerator};
use crate::adapters::search::TavilyClient;
use crate::adapters::sqlite::{
    database_url, initialize_database, reset_database, SqliteLeadRepository,
    SqliteLessonRepository, SqliteStrategyRepository,
};
use crate::application::Hunter;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, FactCheck, MarketResearch, NewLead, ProviderMode, ProvidersConfig,
};
use crate::domain::ports::{
    EventSink, EvidenceProvider, GenerationProvider, LeadRepository, LessonRepository,
    ResearchProvider, StrategyRepository,
};
use crate::services::{
    EventBus, EventBusConfig, GenerativeOutreachDrafter, LeadScorer, PivotController,
    StrategyComposer, StrategyService, TriggerPivotDrafter, ValidationService,
};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Recursive Hunter configuration
# Override settings by editing this file, adding .hunter/local.yaml, or setting
# environment variables with the HUNTER_ prefix ("__" separates nested keys).
#
# Example environment variables:
#   export HUNTER_PROVIDERS__MODE=offline
#   export HUNTER_VALIDATION__MAX_CONCURRENCY=8
#   export HUNTER_LOGGING__LEVEL=debug

database:
  path: ".hunter/hunter.db"
  max_connections: 5

logging:
  # trace, debug, info, warn, error
  level: "info"
  # json, pretty
  format: "pretty"
  # Uncomment for rolling JSON log files
  # log_dir: ".hunter/logs"
  rotation: "daily"

providers:
  # live: HTTP generation and search APIs; offline: deterministic local stand-ins
  mode: "live"
  timeout_secs: 60
  generation:
    base_url: "https://api.pioneer.ai/inference"
    model_id: "base:Qwen/Qwen3-8B"
    # Falls back to FASTINO_PIONEER_API_KEY
    # api_key: ""
    requests_per_second: 5
  search:
    base_url: "https://api.tavily.com"
    # Falls back to TAVILY_API_KEY
    # api_key: ""
    max_results: 5
    requests_per_second: 5
  retry:
    max_retries: 3
    initial_backoff_ms: 200
    max_backoff_ms: 5000

validation:
  max_concurrency: 4
  # Pivot when the Disregard rate is strictly above this
  failure_threshold: 0.6
  small_company_employees: 25
  # Extra refine/validate cycles after a pivot on `strategy generate`
  refinement_cycles: 0
"#;

const SEED_LEADS: &str = include_str!("../../seeds/leads.yaml");

/// Setup paths and directories
pub struct SetupPaths {
    /// `.hunter/`
    pub project_dir: PathBuf,
    /// `.hunter/config.yaml`
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Paths under `root`.
    pub fn new(root: &Path) -> Self {
        let project_dir = root.join(PROJECT_DIR);
        Self {
            config_file: project_dir.join("config.yaml"),
            project_dir,
        }
    }

    /// Setup paths for the current directory
    pub fn current() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::new(&current_dir))
    }

    /// True once `hunter init` has written the config.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Create the project directory
pub fn create_project_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.project_dir).context("Failed to create .hunter directory")
}

/// Write the default config file. Returns whether a file was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// The bundled sample lead set.
pub fn bundled_seed_leads() -> Result<Vec<NewLead>> {
    serde_yaml::from_str(SEED_LEADS).context("Bundled seed file is malformed")
}

/// Read a YAML or JSON list of lead records.
pub fn read_lead_file(path: &Path) -> Result<Vec<NewLead>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read lead file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON lead list in {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML lead list in {}", path.display()))
    }
}

/// Insert the bundled sample leads if no lead exists yet. Returns the number
/// inserted.
pub async fn seed_leads(leads: &dyn LeadRepository) -> Result<usize> {
    let existing = leads.count().await?;
    if existing > 0 {
        info!(existing, "lead table not empty, skipping seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for record in bundled_seed_leads()? {
        let lead = crate::domain::models::Lead::from(record);
        if leads.insert(&lead).await? {
            inserted += 1;
        }
    }
    info!(inserted, "seeded sample leads");
    Ok(inserted)
}

/// Provider slots the core depends on.
#[derive(Clone)]
pub struct Providers {
    /// Market research
    pub research: Arc<dyn ResearchProvider>,
    /// Text generation
    pub generation: Arc<dyn GenerationProvider>,
    /// Fact checking
    pub evidence: Arc<dyn EvidenceProvider>,
}

impl Providers {
    /// Deterministic in-process providers.
    pub fn offline() -> Self {
        Self {
            research: Arc::new(offline_research()),
            generation: Arc::new(OfflineGenerator),
            evidence: Arc::new(offline_evidence()),
        }
    }

    /// Build providers for the configured mode. In live mode a provider with
    /// no API key is replaced by one that fails every call, so that commands
    /// that never reach a provider still work.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        if config.mode == ProviderMode::Offline {
            return Ok(Self::offline());
        }

        let timeout = Duration::from_secs(config.timeout_secs);

        let generation: Arc<dyn GenerationProvider> = if config.generation.api_key.is_some() {
            Arc::new(
                PioneerClient::new(&config.generation, config.retry.clone(), timeout)
                    .context("Failed to build generation client")?,
            )
        } else {
            Arc::new(UnconfiguredProvider::new("pioneer", GENERATION_KEY_ENV))
        };

        let (research, evidence) = if config.search.api_key.is_some() {
            let client = Arc::new(
                TavilyClient::new(&config.search, config.retry.clone(), timeout)
                    .context("Failed to build search client")?,
            );
            (
                client.clone() as Arc<dyn ResearchProvider>,
                client as Arc<dyn EvidenceProvider>,
            )
        } else {
            let missing = Arc::new(UnconfiguredProvider::new("tavily", SEARCH_KEY_ENV));
            (
                missing.clone() as Arc<dyn ResearchProvider>,
                missing as Arc<dyn EvidenceProvider>,
            )
        };

        Ok(Self {
            research,
            generation,
            evidence,
        })
    }
}

/// Names of the environment variables whose keys a live run still needs.
pub fn missing_api_keys(config: &ProvidersConfig) -> Vec<&'static str> {
    if config.mode == ProviderMode::Offline {
        return Vec::new();
    }
    let mut missing = Vec::new();
    if config.generation.api_key.is_none() {
        missing.push(GENERATION_KEY_ENV);
    }
    if config.search.api_key.is_none() {
        missing.push(SEARCH_KEY_ENV);
    }
    missing
}

/// Stand-in for a live provider whose API key is not configured.
struct UnconfiguredProvider {
    provider: &'static str,
    key_env: &'static str,
}

impl UnconfiguredProvider {
    fn new(provider: &'static str, key_env: &'static str) -> Self {
        Self { provider, key_env }
    }

    fn error(&self) -> DomainError {
        DomainError::provider(
            self.provider,
            format!("API key not configured (set {} or use providers.mode offline)", self.key_env),
        )
    }
}

#[async_trait]
impl ResearchProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        self.provider
    }

    async fn research(&self, _description: &str) -> DomainResult<MarketResearch> {
        Err(self.error())
    }
}

#[async_trait]
impl EvidenceProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        self.provider
    }

    async fn fact_check(&self, _company: &str, _claimed_stack: &[String]) -> DomainResult<FactCheck> {
        Err(self.error())
    }
}

#[async_trait]
impl GenerationProvider for UnconfiguredProvider {
    fn name(&self) -> &'static str {
        self.provider
    }

    async fn complete(&self, _system_prompt: &str, _user_prompt: &str, _max_tokens: u32) -> DomainResult<String> {
        Err(self.error())
    }
}

/// Fully wired agent.
pub struct Runtime {
    /// Facade the commands drive
    pub hunter: Hunter,
    /// Bus every service publishes to
    pub events: Arc<EventBus>,
    /// Shared connection pool
    pub pool: SqlitePool,
}

impl Runtime {
    /// Open the configured database (creating and migrating it if needed)
    /// and wire providers for the configured mode.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = initialize_database(&database_url(&config.database.path), config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.path))?;
        let providers = Providers::from_config(&config.providers)?;
        Ok(Self::assemble(config, pool, providers))
    }

    /// Wire repositories, services and the facade over an open pool.
    pub fn assemble(config: &Config, pool: SqlitePool, providers: Providers) -> Self {
        let timeout = Duration::from_secs(config.providers.timeout_secs);
        let validation_config = &config.validation;

        let strategies: Arc<dyn StrategyRepository> =
            Arc::new(SqliteStrategyRepository::new(pool.clone()));
        let leads: Arc<dyn LeadRepository> = Arc::new(SqliteLeadRepository::new(pool.clone()));
        let lessons: Arc<dyn LessonRepository> = Arc::new(SqliteLessonRepository::new(pool.clone()));

        let bus = Arc::new(EventBus::new(EventBusConfig::default()));
        let events: Arc<dyn EventSink> = bus.clone();

        let strategy_service = StrategyService::new(
            providers.research,
            StrategyComposer::new(providers.generation.clone(), timeout),
            strategies.clone(),
            lessons.clone(),
            events.clone(),
            timeout,
            config.providers.retry.clone(),
        );

        let scorer = Arc::new(LeadScorer::new(
            providers.evidence,
            providers.generation.clone(),
            leads.clone(),
            timeout,
            validation_config.small_company_employees,
        ));
        let validation = ValidationService::new(
            strategies.clone(),
            leads.clone(),
            scorer,
            PivotController::new(lessons.clone(), validation_config.failure_threshold),
            events.clone(),
            validation_config.max_concurrency,
        );

        let triggers = TriggerPivotDrafter::new(
            strategies,
            leads.clone(),
            lessons.clone(),
            Arc::new(GenerativeOutreachDrafter::new(providers.generation, timeout)),
            events.clone(),
            validation_config.max_concurrency,
        );

        let hunter = Hunter::new(
            strategy_service,
            validation,
            triggers,
            leads,
            lessons,
            events,
            validation_config.refinement_cycles,
        );

        Self {
            hunter,
            events: bus,
            pool,
        }
    }

    /// Delete every row. Leads are only ever removed through here.
    pub async fn reset(&self) -> Result<()> {
        reset_database(&self.pool).await.context("Failed to reset database")
    }

    /// Insert the bundled sample leads. Returns how many were new.
    pub async fn seed(&self) -> Result<usize> {
        let leads = SqliteLeadRepository::new(self.pool.clone());
        seed_leads(&leads).await
    }
}

/// Outcome of `hunter init`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InitReport {
    /// Project directory that was set up
    pub project_dir: PathBuf,
    /// False when a config already existed
    pub config_written: bool,
    /// Whether rows were deleted
    pub reset: bool,
    /// Sample leads inserted
    pub seeded: usize,
}

/// Create `.hunter/`, the default config and the database. Optionally wipe
/// all rows and insert the bundled sample leads.
pub async fn initialize_project(
    paths: &SetupPaths,
    config: &Config,
    reset: bool,
    seed: bool,
) -> Result<InitReport> {
    create_project_dir(paths)?;
    let config_written = create_config_file(paths, false)?;

    let pool = initialize_database(&database_url(&config.database.path), config.database.max_connections)
        .await
        .with_context(|| format!("Failed to create database {}", config.database.path))?;

    if reset {
        warn!("resetting database");
        reset_database(&pool).await.context("Failed to reset database")?;
    }
    let seeded = if seed {
        seed_leads(&SqliteLeadRepository::new(pool.clone())).await?
    } else {
        0
    };
    pool.close().await;

    Ok(InitReport {
        project_dir: paths.project_dir.clone(),
        config_written,
        reset,
        seeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[test]
    fn test_bundled_seed_has_twenty_valid_leads() {
        let leads = bundled_seed_leads().unwrap();
        assert_eq!(leads.len(), 20);
        for record in leads {
            let lead = crate::domain::models::Lead::from(record);
            lead.validate().unwrap();
        }
    }

    #[test]
    fn test_default_template_parses_and_validates() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        crate::infrastructure::config::ConfigLoader::validate(&config).unwrap();
        assert_eq!(config.providers.mode, ProviderMode::Live);
    }

    #[test]
    fn test_read_lead_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("leads.json");
        fs::write(&json, r#"[{"domain": "acme.io", "name": "Acme", "funding": "Seed"}]"#).unwrap();
        let yaml = dir.path().join("leads.yaml");
        fs::write(&yaml, "- domain: beta.io\n  name: Beta\n  employees: 40\n").unwrap();

        let from_json = read_lead_file(&json).unwrap();
        assert_eq!(from_json[0].funding_stage.as_deref(), Some("Seed"));
        let from_yaml = read_lead_file(&yaml).unwrap();
        assert_eq!(from_yaml[0].employees, Some(40));
    }

    #[test]
    fn test_config_file_not_overwritten_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::new(dir.path());
        create_project_dir(&paths).unwrap();
        assert!(create_config_file(&paths, false).unwrap());
        fs::write(&paths.config_file, "logging:\n  level: warn\n").unwrap();
        assert!(!create_config_file(&paths, false).unwrap());
        assert!(fs::read_to_string(&paths.config_file).unwrap().contains("warn"));
        assert!(paths.is_initialized());
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_table() {
        let pool = create_migrated_test_pool().await.unwrap();
        let leads = SqliteLeadRepository::new(pool);
        assert_eq!(seed_leads(&leads).await.unwrap(), 20);
        assert_eq!(seed_leads(&leads).await.unwrap(), 0);
        assert_eq!(leads.count().await.unwrap(), 20);
    }

    #[test]
    fn test_missing_api_keys() {
        let mut config = ProvidersConfig::default();
        assert_eq!(missing_api_keys(&config), vec![GENERATION_KEY_ENV, SEARCH_KEY_ENV]);
        config.search.api_key = Some("tvly".to_string());
        assert_eq!(missing_api_keys(&config), vec![GENERATION_KEY_ENV]);
        config.mode = ProviderMode::Offline;
        assert!(missing_api_keys(&config).is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_names_the_variable() {
        let providers = Providers::from_config(&ProvidersConfig::default()).unwrap();
        let err = providers.generation.complete("s", "u", 10).await.unwrap_err();
        assert!(err.to_string().contains(GENERATION_KEY_ENV));
        let err = providers.research.research("x").await.unwrap_err();
        assert!(err.to_string().contains(SEARCH_KEY_ENV));
    }

    #[tokio::test]
    async fn test_init_creates_database_and_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::new(dir.path());
        let mut config = Config::default();
        config.database.path = paths.project_dir.join("hunter.db").display().to_string();

        let report = initialize_project(&paths, &config, false, true).await.unwrap();
        assert!(report.config_written);
        assert_eq!(report.seeded, 20);

        let report = initialize_project(&paths, &config, true, true).await.unwrap();
        assert!(!report.config_written);
        assert_eq!(report.seeded, 20);
    }
}
