//! Error types for Tally

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed category cache: {0}")]
    MalformedCache(String),

    #[error("Invalid budget file: {0}")]
    InvalidBudget(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Ambiguous amount for '{name}' on {date}: neither debit nor credit is set")]
    AmbiguousAmount { name: String, date: String },

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Unreadable statement file {}: {reason}", path.display())]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Run interrupted by user")]
    Interrupted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error must stop the whole run (as opposed to skipping a row or file)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::AmbiguousAmount { .. } | Error::MalformedRow(_) | Error::FileUnreadable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
