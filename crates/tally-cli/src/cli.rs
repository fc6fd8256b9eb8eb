//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize bank statements into a monthly budget
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Bank-statement categorizer and monthly budget rollup", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./tally.toml, then the user data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every statement file and write the budget
    Run {
        /// Directory of statement CSV files
        #[arg(short, long)]
        statements: Option<PathBuf>,

        /// Category cache (JSON)
        #[arg(short, long)]
        cache: Option<PathBuf>,

        /// Output directory for budgets and the history log
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories and how many transaction names each knows
    Categories,

    /// Show which category a transaction name would get, without learning it
    Classify {
        /// Transaction name as it appears on the statement
        name: String,

        /// Amount, for rules with an amount condition
        #[arg(short, long)]
        amount: Option<f64>,
    },
}
