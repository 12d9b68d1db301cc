//! Lesson CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::commands::open_runtime;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, Lesson};

/// Arguments for `hunter lesson`
#[derive(Args, Debug)]
pub struct LessonArgs {
    /// Lesson subcommand to run
    #[command(subcommand)]
    pub command: LessonCommands,
}

/// Lesson subcommands
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    /// List lessons, oldest first
    List {
        /// Only lessons recorded against this lead domain
        #[arg(long, conflicts_with = "strategy")]
        lead: Option<String>,
        /// Only lessons recorded against this strategy version
        #[arg(long)]
        strategy: Option<u32>,
    },
}

/// Output of `hunter lesson list`.
#[derive(Debug, Serialize)]
pub struct LessonListOutput {
    /// Matching lessons
    pub lessons: Vec<Lesson>,
    /// Number of lessons
    pub total: usize,
}

impl CommandOutput for LessonListOutput {
    fn to_human(&self) -> String {
        if self.lessons.is_empty() {
            return "No lessons recorded.".to_string();
        }
        format!(
            "{} lesson(s):\n{}",
            self.total,
            TableFormatter::new().format_lessons(&self.lessons)
        )
    }
}

/// Run a `hunter lesson` subcommand.
pub async fn execute(args: LessonArgs, config: &Config, json_mode: bool) -> Result<()> {
    let runtime = open_runtime(config).await?;
    let hunter = &runtime.hunter;

    match args.command {
        LessonCommands::List { lead, strategy } => {
            let lessons = match (lead, strategy) {
                (Some(domain), _) => hunter.lessons_for_lead(&domain).await?,
                (None, Some(version)) => hunter.lessons_for_strategy(version).await?,
                (None, None) => hunter.all_lessons().await?,
            };
            output(
                &LessonListOutput {
                    total: lessons.len(),
                    lessons,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
