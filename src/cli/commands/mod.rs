//! CLI command implementations.

pub mod init;
pub mod lead;
pub mod lesson;
pub mod strategy;
pub mod trigger;
pub mod validate;

use anyhow::{bail, Context, Result};

use crate::domain::models::Config;
use crate::infrastructure::setup::{missing_api_keys, Runtime};

/// Load the database and providers for a command.
pub async fn open_runtime(config: &Config) -> Result<Runtime> {
    Runtime::open(config)
        .await
        .context("Failed to open the hunter database. Run 'hunter init' first.")
}

/// Fail early when a command will call live providers without keys.
pub fn require_providers(config: &Config) -> Result<()> {
    let missing = missing_api_keys(&config.providers);
    if !missing.is_empty() {
        bail!(
            "Missing API key(s): {}. Set them, configure providers.*.api_key, or use HUNTER_PROVIDERS__MODE=offline.",
            missing.join(", ")
        );
    }
    Ok(())
}
