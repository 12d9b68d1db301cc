//! Implementation of the `hunter trigger` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::{open_runtime, require_providers};
use crate::cli::output::{output, CommandOutput, EventProgress};
use crate::domain::models::{Config, TriggerEvent, TriggerOutcome};

/// Arguments for `hunter trigger`
#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Competitor the event concerns, e.g. DigitalOcean
    #[arg(long)]
    pub competitor: String,

    /// Event status, e.g. outage or price_hike
    #[arg(long)]
    pub status: String,
}

/// Output of `hunter trigger`.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct TriggerOutput(pub TriggerOutcome);

impl CommandOutput for TriggerOutput {
    fn to_human(&self) -> String {
        let outcome = &self.0;
        let scope = if outcome.broadcast {
            "no lead names the competitor, drafted for every target"
        } else {
            "leads naming the competitor"
        };
        let mut lines = vec![format!(
            "{} at {}: {} lead(s) affected under strategy v{} ({scope})",
            outcome.status, outcome.competitor, outcome.affected_leads, outcome.strategy_version
        )];
        for email in &outcome.emails {
            lines.push(format!(
                "\nTo: {} ({})\nSubject: {}\n\n{}",
                email.company, email.domain, email.subject, email.body
            ));
        }
        if let Some(lesson_id) = &outcome.lesson_id {
            lines.push(format!("\nRecorded lesson {lesson_id}"));
        }
        lines.join("\n")
    }
}

/// Run `hunter trigger`.
pub async fn execute(args: TriggerArgs, config: &Config, json_mode: bool) -> Result<()> {
    require_providers(config)?;
    let runtime = open_runtime(config).await?;
    let event = TriggerEvent::new(args.status, args.competitor);

    let progress = EventProgress::attach(&runtime.events, !json_mode);
    let result = runtime.hunter.handle_trigger(&event).await;
    progress.finish();

    let outcome = result.context("Trigger handling failed")?;
    output(&TriggerOutput(outcome), json_mode);
    Ok(())
}
