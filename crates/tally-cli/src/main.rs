//! Tally CLI - Bank-statement categorizer
//!
//! Usage:
//!   tally run                     Classify statements and write the budget
//!   tally categories              List categories in the cache
//!   tally classify "NAME"         Preview how a transaction name is classified

mod cli;
mod commands;
mod oracle;


use anyhow::{Context, Result};
use clap::Parser;
use tally_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so prompts and --json output own stdout
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            statements,
            cache,
            output,
            json,
        } => {
            let config = commands::apply_overrides(config, statements, cache, output);
            commands::cmd_run(config, json).await
        }
        Commands::Categories => commands::cmd_categories(&config),
        Commands::Classify { name, amount } => commands::cmd_classify(&config, &name, amount),
    }
}
