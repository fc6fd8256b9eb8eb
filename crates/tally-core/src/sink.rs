//! Output sinks for run results
//!
//! A run produces four artifacts:
//! - the updated category cache (rewritten in place)
//! - the structured budget (JSON)
//! - the tabular budget (CSV grid)
//! - the historical transactions log (CSV, appended after each statement)
//!
//! Budget and history files carry the run start time in their name:
//! `budget_2024-01-15_09-30-00.csv`.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::categories::CategoryStore;
use crate::error::{Error, Result};
use crate::ledger::MonthlyLedger;
use crate::models::{TransactionRecord, UNKNOWN_CATEGORY};

/// Header of the historical transactions log
pub const HISTORY_HEADER: [&str; 6] = ["Date", "TransName", "Debit", "Credit", "CurTot", "TransType"];

/// Trait for run output destinations
pub trait OutputSink {
    /// Sink name (e.g., "files", "memory")
    fn name(&self) -> &str;

    /// Persist the learned category mapping
    fn write_category_cache(&mut self, store: &CategoryStore) -> Result<()>;

    /// Persist the nested category → month → total mapping
    fn write_budget(&mut self, ledger: &MonthlyLedger) -> Result<()>;

    /// Persist the `Category,Jan,...,Dec` grid
    fn write_budget_table(&mut self, ledger: &MonthlyLedger) -> Result<()>;

    /// Append classified rows to the historical log
    fn append_history(&mut self, records: &[TransactionRecord]) -> Result<()>;
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_category_cache(&mut self, store: &CategoryStore) -> Result<()> {
        (**self).write_category_cache(store)
    }

    fn write_budget(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        (**self).write_budget(ledger)
    }

    fn write_budget_table(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        (**self).write_budget_table(ledger)
    }

    fn append_history(&mut self, records: &[TransactionRecord]) -> Result<()> {
        (**self).append_history(records)
    }
}

/// File names (before timestamping) for the run outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub history_file: String,
    pub budget_file: String,
    pub budget_json: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            history_file: "transaction_history.csv".to_string(),
            budget_file: "budget.csv".to_string(),
            budget_json: "budget.json".to_string(),
        }
    }
}

/// Filesystem sink: cache rewritten atomically, outputs timestamped in one directory
#[derive(Debug)]
pub struct FileSink {
    category_cache: PathBuf,
    budget_json: PathBuf,
    budget_table: PathBuf,
    history: PathBuf,
}

impl FileSink {
    /// Create a sink writing into `output_dir`
    ///
    /// Creates the output directory if it doesn't exist.
    pub fn new(
        category_cache: impl Into<PathBuf>,
        output_dir: &Path,
        names: &OutputNames,
        run_started: NaiveDateTime,
    ) -> Result<Self> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).map_err(|e| {
                Error::Output(format!(
                    "Failed to create output directory {}: {}",
                    output_dir.display(),
                    e
                ))
            })?;
            info!("Created output directory: {}", output_dir.display());
        }

        Ok(Self {
            category_cache: category_cache.into(),
            budget_json: output_dir.join(timestamped_name(&names.budget_json, run_started)),
            budget_table: output_dir.join(timestamped_name(&names.budget_file, run_started)),
            history: output_dir.join(timestamped_name(&names.history_file, run_started)),
        })
    }

    pub fn category_cache_path(&self) -> &Path {
        &self.category_cache
    }

    pub fn budget_json_path(&self) -> &Path {
        &self.budget_json
    }

    pub fn budget_table_path(&self) -> &Path {
        &self.budget_table
    }

    pub fn history_path(&self) -> &Path {
        &self.history
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        "files"
    }

    fn write_category_cache(&mut self, store: &CategoryStore) -> Result<()> {
        write_atomic(&self.category_cache, |w| store.persist(w))?;
        info!("Saved category cache to {}", self.category_cache.display());
        Ok(())
    }

    fn write_budget(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        write_atomic(&self.budget_json, |w| ledger.persist_structured(w))?;
        info!("Saved budget to {}", self.budget_json.display());
        Ok(())
    }

    fn write_budget_table(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        write_atomic(&self.budget_table, |w| ledger.persist_tabular(w))?;
        info!("Saved budget table to {}", self.budget_table.display());
        Ok(())
    }

    fn append_history(&mut self, records: &[TransactionRecord]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history)
            .map_err(|e| output_error(&self.history, e))?;
        let needs_header = file
            .metadata()
            .map_err(|e| output_error(&self.history, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if needs_header {
            writer.write_record(HISTORY_HEADER)?;
        }
        for record in records {
            writer.write_record(history_row(record))?;
        }
        writer.flush().map_err(|e| output_error(&self.history, e))?;

        debug!(
            "Appended {} rows to {}",
            records.len(),
            self.history.display()
        );
        Ok(())
    }
}

/// `budget.csv` → `budget_2024-01-15_09-30-00.csv`
pub fn timestamped_name(file_name: &str, run_started: NaiveDateTime) -> String {
    let stamp = run_started.format("%Y-%m-%d_%H-%M-%S");
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());

    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    }
}

/// One history log row for a classified record
pub fn history_row(record: &TransactionRecord) -> [String; 6] {
    let cell = |amount: Option<f64>| amount.map(|a| format!("{:.2}", a)).unwrap_or_default();
    [
        record.date.format("%Y-%m-%d").to_string(),
        record.name.clone(),
        cell(record.debit),
        cell(record.credit),
        cell(record.running_balance),
        record
            .category
            .clone()
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
    ]
}

/// Write through a temp file in the destination directory, then rename over the target
fn write_atomic<F>(path: &Path, contents: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| output_error(&dir, e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| output_error(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        contents(&mut writer)?;
        writer.flush().map_err(|e| output_error(path, e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| output_error(path, e))?;
    temp.persist(path).map_err(|e| output_error(path, e.error))?;

    Ok(())
}

fn output_error(path: &Path, e: std::io::Error) -> Error {
    Error::Output(format!("Failed to write {}: {}", path.display(), e))
}
