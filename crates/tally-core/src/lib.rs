//! Tally Core Library
//!
//! Bank-statement categorization and monthly budget rollup:
//! - Category store of learned transaction names
//! - Heuristic rule table and the layered classifier
//! - Monthly ledger with structured and tabular output
//! - Statement CSV reader and the per-file runner
//! - Output sinks and TOML configuration

pub mod amount;
pub mod categories;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod rules;
pub mod runner;
pub mod sink;
pub mod statement;

/// Scripted oracle and in-memory sink
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use amount::{ensure_amount, normalize_amount};
pub use categories::{CategoryStore, LookupMode};
pub use classifier::{CategoryOracle, Classifier, OracleAnswer};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::MonthlyLedger;
pub use models::{
    Classification, ClassificationSource, Month, TransactionContext, TransactionRecord,
    INCOME_CATEGORY, UNKNOWN_CATEGORY,
};
pub use rules::{HeuristicRule, PatternType, RuleSet, RuleSpec};
pub use runner::{Interrupt, RunReport, RunSummary, StatementRunner};
pub use sink::{FileSink, OutputNames, OutputSink};
