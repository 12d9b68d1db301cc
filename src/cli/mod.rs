//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    init::InitArgs, lead::LeadArgs, lesson::LessonArgs, strategy::StrategyArgs,
    trigger::TriggerArgs, validate::ValidateArgs,
};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "hunter")]
#[command(about = "Recursive Hunter - self-correcting sales targeting agent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to use instead of .hunter/config.yaml and .hunter/local.yaml
    #[arg(short, long, global = true, env = "HUNTER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .hunter/, the default config and the database
    Init(InitArgs),
    /// Inspect and manage leads
    Lead(LeadArgs),
    /// Generate and inspect ICP strategies
    Strategy(StrategyArgs),
    /// Run a validation pass over a strategy's leads
    Validate(ValidateArgs),
    /// React to a competitor market event
    Trigger(TriggerArgs),
    /// Inspect recorded lessons
    Lesson(LessonArgs),
}

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
