//! Implementation of the `hunter validate` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::{open_runtime, require_providers};
use crate::cli::output::{output, CommandOutput, EventProgress, TableFormatter};
use crate::domain::models::{Config, ValidationReport};

/// Arguments for `hunter validate`
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Strategy version to validate (defaults to the latest)
    #[arg(short, long)]
    pub version: Option<u32>,
}

/// Human summary of a validation pass.
pub fn render_report(report: &ValidationReport) -> String {
    let mut lines = vec![
        format!(
            "Validated strategy v{}: {} lead(s)",
            report.strategy_version, report.total_leads
        ),
        format!(
            "  Strike {}  Monitor {}  Disregard {}  Errored {}",
            report.strike, report.monitor, report.disregard, report.errored
        ),
        format!("  Disregard rate: {:.0}%", report.disregard_rate * 100.0),
    ];
    if report.pivot_triggered {
        lines.push(format!(
            "  {} lesson {}",
            console::style("Pivot triggered:").yellow().bold(),
            report.pivot_lesson_id.as_deref().unwrap_or("-")
        ));
    }
    if let Some(error) = &report.pivot_error {
        lines.push(format!("  Pivot not evaluated: {error}"));
    }
    if !report.results.is_empty() {
        lines.push(TableFormatter::new().format_validation_results(&report.results));
    }
    lines.join("\n")
}

/// Output of `hunter validate`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ValidateOutput(pub ValidationReport);

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        render_report(&self.0)
    }
}

/// Run `hunter validate`.
pub async fn execute(args: ValidateArgs, config: &Config, json_mode: bool) -> Result<()> {
    require_providers(config)?;
    let runtime = open_runtime(config).await?;

    let progress = EventProgress::attach(&runtime.events, !json_mode);
    let result = runtime.hunter.run_validation(args.version).await;
    progress.finish();

    output(&ValidateOutput(result?), json_mode);
    Ok(())
}
