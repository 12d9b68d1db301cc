//! Configuration model shared by the loader and the runtime.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the hunter agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Validation pass and pivot configuration
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".hunter/hunter.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Which provider implementations the runtime wires in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    /// HTTP generation and search APIs
    #[default]
    Live,
    /// Deterministic in-process providers, no network
    Offline,
}

/// External provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvidersConfig {
    /// Live providers or offline stand-ins
    #[serde(default)]
    pub mode: ProviderMode,

    /// Upper bound on any single provider call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Generation API settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Search API settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Retry policy for transient HTTP failures and version conflicts
    #[serde(default)]
    pub retry: RetryConfig,
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            mode: ProviderMode::default(),
            timeout_secs: default_timeout_secs(),
            generation: GenerationConfig::default(),
            search: SearchConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Generation (inference) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Inference endpoint
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Model requested from the endpoint
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Falls back to `FASTINO_PIONEER_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_generation_base_url() -> String {
    "https://api.pioneer.ai/inference".to_string()
}

fn default_model_id() -> String {
    "base:Qwen/Qwen3-8B".to_string()
}

const fn default_requests_per_second() -> u32 {
    5
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model_id: default_model_id(),
            api_key: None,
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Web-search API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Search API endpoint
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Falls back to `TAVILY_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Hits requested per search
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

const fn default_max_results() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            api_key: None,
            max_results: default_max_results(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    200
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Validation pass and pivot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ValidationConfig {
    /// Leads validated in parallel within one pass
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Disregard rate that must be strictly exceeded to pivot
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,

    /// Companies below this headcount get a CompanyTooSmall lesson
    #[serde(default = "default_small_company_employees")]
    pub small_company_employees: u32,

    /// Extra refine/store/validate cycles after a pivot on submission
    #[serde(default)]
    pub refinement_cycles: u32,
}

const fn default_max_concurrency() -> usize {
    4
}

const fn default_failure_threshold() -> f64 {
    0.6
}

const fn default_small_company_employees() -> u32 {
    25
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            failure_threshold: default_failure_threshold(),
            small_company_employees: default_small_company_employees(),
            refinement_cycles: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, ".hunter/hunter.db");
        assert_eq!(config.providers.mode, ProviderMode::Live);
        assert!((config.validation.failure_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.validation.small_company_employees, 25);
        assert_eq!(config.validation.refinement_cycles, 0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config =
            serde_yaml::from_str("providers:\n  mode: offline\nvalidation:\n  max_concurrency: 8\n")
                .unwrap();
        assert_eq!(config.providers.mode, ProviderMode::Offline);
        assert_eq!(config.providers.timeout_secs, 60);
        assert_eq!(config.validation.max_concurrency, 8);
        assert_eq!(config.logging.level, "info");
    }
}
