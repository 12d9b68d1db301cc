//! Hierarchical configuration loading with figment.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding config, database and logs.
pub const PROJECT_DIR: &str = ".hunter";

/// Fallback environment variables for provider API keys.
pub const GENERATION_KEY_ENV: &str = "FASTINO_PIONEER_API_KEY";
/// Fallback environment variable for the search API key.
pub const SEARCH_KEY_ENV: &str = "TAVILY_API_KEY";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown log level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown log format
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown rotation policy
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// Blank database path
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    /// Zero pool size
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    /// Threshold outside (0, 1)
    #[error("Invalid failure_threshold: {0}. Must be strictly between 0 and 1")]
    InvalidFailureThreshold(f64),

    /// Zero concurrency
    #[error("Invalid max_concurrency: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    /// Zero provider timeout
    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    /// Names the provider section
    #[error("Invalid requests_per_second for {0}: must be at least 1")]
    InvalidRateLimit(&'static str),

    /// Initial and max backoff, in milliseconds
    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .hunter/config.yaml (created by `hunter init`)
    /// 3. .hunter/local.yaml (optional overrides)
    /// 4. Environment variables (HUNTER_* prefix, `__` for nesting)
    ///
    /// An explicit file replaces steps 2 and 3.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_from(Path::new(PROJECT_DIR), explicit)
    }

    /// Load with `project_dir` standing in for `.hunter/`.
    pub fn load_from(project_dir: &Path, explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        figment = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                figment.merge(Yaml::file(path))
            }
            None => figment
                .merge(Yaml::file(project_dir.join("config.yaml")))
                .merge(Yaml::file(project_dir.join("local.yaml"))),
        };

        let mut config: Config = figment
            .merge(Env::prefixed("HUNTER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::apply_key_fallbacks(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Fill unset API keys from the providers' conventional variables.
    pub fn apply_key_fallbacks(config: &mut Config) {
        if config.providers.generation.api_key.is_none() {
            config.providers.generation.api_key = non_empty_env(GENERATION_KEY_ENV);
        }
        if config.providers.search.api_key.is_none() {
            config.providers.search.api_key = non_empty_env(SEARCH_KEY_ENV);
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(0));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let threshold = config.validation.failure_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::InvalidFailureThreshold(threshold));
        }
        if config.validation.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }

        let providers = &config.providers;
        if providers.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(0));
        }
        if providers.generation.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit("generation"));
        }
        if providers.search.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit("search"));
        }
        if providers.retry.initial_backoff_ms >= providers.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                providers.retry.initial_backoff_ms,
                providers.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }

    /// Where `hunter init` writes the default config.
    pub fn project_config_path() -> PathBuf {
        Path::new(PROJECT_DIR).join("config.yaml")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
