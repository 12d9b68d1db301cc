//! Recursive Hunter CLI entry point.

use anyhow::Context;
use clap::Parser;

use recursive_hunter::cli::{commands, handle_error, Cli, Commands};
use recursive_hunter::infrastructure::config::ConfigLoader;
use recursive_hunter::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration") {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging).and_then(|c| LoggerImpl::init(&c)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Lead(args) => commands::lead::execute(args, &config, cli.json).await,
        Commands::Strategy(args) => commands::strategy::execute(args, &config, cli.json).await,
        Commands::Validate(args) => commands::validate::execute(args, &config, cli.json).await,
        Commands::Trigger(args) => commands::trigger::execute(args, &config, cli.json).await,
        Commands::Lesson(args) => commands::lesson::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
