//! Implementation of the `hunter init` command.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::setup::{initialize_project, InitReport, SetupPaths};

/// Arguments for `hunter init`
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Delete all strategies, leads, evidence and lessons
    #[arg(long)]
    pub reset: bool,

    /// Insert the bundled sample leads if no lead exists
    #[arg(long)]
    pub seed: bool,
}

/// Result of `hunter init`.
#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    /// Always true on the success path
    pub success: bool,
    /// What setup did
    #[serde(flatten)]
    pub report: InitReport,
    /// Database URL in use
    pub database: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Initialized {}", self.report.project_dir.display())];
        if self.report.config_written {
            lines.push("  - wrote default config.yaml".to_string());
        }
        lines.push(format!("  - database ready at {}", self.database));
        if self.report.reset {
            lines.push("  - all rows deleted".to_string());
        }
        if self.report.seeded > 0 {
            lines.push(format!("  - seeded {} sample lead(s)", self.report.seeded));
        }
        lines.join("\n")
    }
}

/// Run `hunter init`.
pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let paths = SetupPaths::current()?;
    let report = initialize_project(&paths, config, args.reset, args.seed).await?;
    output(
        &InitOutput {
            success: true,
            report,
            database: config.database.path.clone(),
        },
        json_mode,
    );
    Ok(())
}
