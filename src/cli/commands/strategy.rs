//! Strategy CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::validate::render_report;
use crate::application::Submission;
use crate::cli::commands::{open_runtime, require_providers};
use crate::cli::output::{or_dash, output, CommandOutput, EventProgress, TableFormatter};
use crate::domain::models::{Config, Strategy};

/// Arguments for `hunter strategy`
#[derive(Args, Debug)]
pub struct StrategyArgs {
    /// Strategy subcommand to run
    #[command(subcommand)]
    pub command: StrategyCommands,
}

/// Strategy subcommands
#[derive(Subcommand, Debug)]
pub enum StrategyCommands {
    /// Research, compose or refine, store and validate a strategy
    Generate {
        /// Product or service description
        description: String,
        /// Extra refine/validate cycles after a pivot (overrides config)
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// List all strategy versions
    List,
    /// Show one strategy (defaults to the latest)
    Show {
        /// Strategy version
        version: Option<u32>,
    },
}

fn render_strategy(strategy: &Strategy) -> String {
    [
        format!(
            "Strategy v{} (evolved from {})",
            strategy.version,
            or_dash(strategy.evolved_from)
        ),
        format!("Product: {}", strategy.product_description),
        format!("ICP: {}", strategy.icp),
        format!("Keywords: {}", strategy.keywords.join(", ")),
        format!("Competitors: {}", strategy.competitors.join(", ")),
        format!("Created: {}", strategy.created_at.to_rfc3339()),
    ]
    .join("\n")
}

/// Output of `hunter strategy generate`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SubmissionOutput(pub Submission);

impl CommandOutput for SubmissionOutput {
    fn to_human(&self) -> String {
        let mut sections = Vec::new();
        for (i, round) in self.0.rounds.iter().enumerate() {
            let generation = &round.generation;
            let mut lines = vec![
                format!(
                    "Round {}: {} using {} lesson(s)",
                    i + 1,
                    generation.mode.as_str(),
                    generation.lessons_used
                ),
                render_strategy(&generation.strategy),
            ];
            if let Some(report) = &round.validation {
                lines.push(render_report(report));
            }
            if let Some(error) = &round.validation_error {
                lines.push(format!("Validation failed: {error}"));
            }
            sections.push(lines.join("\n"));
        }
        sections.join("\n\n")
    }
}

/// Output of `hunter strategy list`.
#[derive(Debug, Serialize)]
pub struct StrategyListOutput {
    /// Strategies, newest first
    pub strategies: Vec<Strategy>,
    /// Number of strategies
    pub total: usize,
}

impl CommandOutput for StrategyListOutput {
    fn to_human(&self) -> String {
        if self.strategies.is_empty() {
            return "No strategies yet. Run 'hunter strategy generate <description>'.".to_string();
        }
        TableFormatter::new().format_strategies(&self.strategies)
    }
}

/// Output of `hunter strategy show`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StrategyOutput(pub Strategy);

impl CommandOutput for StrategyOutput {
    fn to_human(&self) -> String {
        render_strategy(&self.0)
    }
}

/// Run a `hunter strategy` subcommand.
pub async fn execute(args: StrategyArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        StrategyCommands::Generate { description, cycles } => {
            require_providers(config)?;
            let runtime = open_runtime(config).await?;
            let progress = EventProgress::attach(&runtime.events, !json_mode);
            let result = runtime.hunter.submit_product(&description, cycles).await;
            progress.finish();
            let submission = result.context("Strategy generation failed")?;
            output(&SubmissionOutput(submission), json_mode);
        }
        StrategyCommands::List => {
            let runtime = open_runtime(config).await?;
            let strategies = runtime.hunter.strategies().await?;
            output(
                &StrategyListOutput {
                    total: strategies.len(),
                    strategies,
                },
                json_mode,
            );
        }
        StrategyCommands::Show { version } => {
            let runtime = open_runtime(config).await?;
            let strategy = runtime.hunter.strategy(version).await?;
            output(&StrategyOutput(strategy), json_mode);
        }
    }
    Ok(())
}
