//! Lead CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::application::{ImportSummary, LeadDetail};
use crate::cli::commands::open_runtime;
use crate::cli::output::{or_dash, output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, Lead};
use crate::infrastructure::setup::read_lead_file;

/// Arguments for `hunter lead`
#[derive(Args, Debug)]
pub struct LeadArgs {
    /// Lead subcommand to run
    #[command(subcommand)]
    pub command: LeadCommands,
}

/// Lead subcommands
#[derive(Subcommand, Debug)]
pub enum LeadCommands {
    /// List all leads
    List,
    /// Show a lead with its evidence and lessons
    Show {
        /// Lead domain, e.g. acme.io
        domain: String,
    },
    /// Import leads from a YAML or JSON list; existing domains are skipped
    Import {
        /// Path to the lead file
        file: PathBuf,
    },
    /// Overwrite a lead's score
    Score {
        /// Lead domain
        domain: String,
        /// New score (0-100)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        score: u8,
    },
}

/// Output of `hunter lead list`.
#[derive(Debug, Serialize)]
pub struct LeadListOutput {
    /// Leads ordered by domain
    pub leads: Vec<Lead>,
    /// Number of leads
    pub total: usize,
}

impl CommandOutput for LeadListOutput {
    fn to_human(&self) -> String {
        if self.leads.is_empty() {
            return "No leads found. Import some with 'hunter lead import' or run 'hunter init --seed'."
                .to_string();
        }
        format!(
            "{} lead(s):\n{}",
            self.total,
            TableFormatter::new().format_leads(&self.leads)
        )
    }
}

/// Output of `hunter lead show`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct LeadDetailOutput(pub LeadDetail);

impl CommandOutput for LeadDetailOutput {
    fn to_human(&self) -> String {
        let LeadDetail {
            lead,
            evidence,
            lessons,
        } = &self.0;
        let mut lines = vec![
            format!("Lead: {} ({})", lead.name, lead.domain),
            format!("Tech stack: {}", lead.tech_stack.join(", ")),
            format!("Employees: {}", or_dash(lead.employees)),
            format!("Funding: {}", or_dash(lead.funding_stage.as_deref())),
            format!("Score: {}", or_dash(lead.score)),
            format!("Classification: {}", or_dash(lead.classification)),
        ];
        let formatter = TableFormatter::new();
        if !evidence.is_empty() {
            lines.push(format!("\nEvidence ({}):", evidence.len()));
            lines.push(formatter.format_evidence(evidence));
        }
        if !lessons.is_empty() {
            lines.push(format!("\nLessons ({}):", lessons.len()));
            lines.push(formatter.format_lessons(lessons));
        }
        lines.join("\n")
    }
}

/// Output of `hunter lead import`.
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    /// File the leads were read from
    pub file: PathBuf,
    /// Inserted and skipped counts
    #[serde(flatten)]
    pub summary: ImportSummary,
}

impl CommandOutput for ImportOutput {
    fn to_human(&self) -> String {
        let mut message = format!(
            "Imported {} lead(s) from {}",
            self.summary.inserted,
            self.file.display()
        );
        if !self.summary.skipped.is_empty() {
            message.push_str(&format!(
                "\nSkipped {} existing domain(s): {}",
                self.summary.skipped.len(),
                self.summary.skipped.join(", ")
            ));
        }
        message
    }
}

/// Output of commands that only report success.
#[derive(Debug, Serialize)]
pub struct LeadActionOutput {
    /// Whether the action succeeded
    pub success: bool,
    /// Human-readable result
    pub message: String,
}

impl CommandOutput for LeadActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

/// Run a `hunter lead` subcommand.
pub async fn execute(args: LeadArgs, config: &Config, json_mode: bool) -> Result<()> {
    let runtime = open_runtime(config).await?;
    let hunter = &runtime.hunter;

    match args.command {
        LeadCommands::List => {
            let leads = hunter.leads().await?;
            output(
                &LeadListOutput {
                    total: leads.len(),
                    leads,
                },
                json_mode,
            );
        }
        LeadCommands::Show { domain } => {
            let detail = hunter
                .lead_detail(&domain)
                .await
                .with_context(|| format!("Failed to load lead {domain}"))?;
            output(&LeadDetailOutput(detail), json_mode);
        }
        LeadCommands::Import { file } => {
            let records = read_lead_file(&file)?;
            let summary = hunter.import_leads(records).await?;
            output(&ImportOutput { file, summary }, json_mode);
        }
        LeadCommands::Score { domain, score } => {
            hunter
                .set_score(&domain, score)
                .await
                .with_context(|| format!("Failed to score lead {domain}"))?;
            output(
                &LeadActionOutput {
                    success: true,
                    message: format!("Set score of {domain} to {score}"),
                },
                json_mode,
            );
        }
    }
    Ok(())
}
