//! Statement runner: per-file, per-row orchestration
//!
//! Files are processed in the order given, rows in file order:
//! parse → classify → normalize → accumulate. Row and file failures are
//! logged and skipped. Fatal errors stop processing, but the category cache
//! and both budget outputs are always written before the run returns.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::amount::{ensure_amount, normalize_amount};
use crate::categories::CategoryStore;
use crate::classifier::{CategoryOracle, Classifier};
use crate::error::{Error, Result};
use crate::ledger::MonthlyLedger;
use crate::models::{ClassificationSource, TransactionRecord};
use crate::rules::RuleSet;
use crate::sink::OutputSink;
use crate::statement::{list_statements, read_statement};

/// Shared flag for a user-requested stop (Ctrl-C or closed input)
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts from one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub rows_accumulated: usize,
    pub rows_skipped: usize,
    /// Rows resolved from previously learned names
    pub learned_matches: usize,
    pub rule_matches: usize,
    pub oracle_answers: usize,
    /// Rows bucketed as Unknown after a cancelled or invalid oracle answer
    pub unresolved: usize,
    /// Transaction names added to the category store
    pub names_learned: usize,
    pub interrupted: bool,
}

impl RunSummary {
    fn count(&mut self, source: ClassificationSource) {
        match source {
            ClassificationSource::Learned => self.learned_matches += 1,
            ClassificationSource::Rule => self.rule_matches += 1,
            ClassificationSource::Oracle => self.oracle_answers += 1,
            ClassificationSource::Unresolved => self.unresolved += 1,
        }
    }
}

/// Final state of a completed (or interrupted) run
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub store: CategoryStore,
    pub ledger: MonthlyLedger,
}

pub struct StatementRunner<O, S> {
    store: CategoryStore,
    ledger: MonthlyLedger,
    classifier: Classifier<O>,
    sink: S,
    interrupt: Interrupt,
    summary: RunSummary,
}

impl<O: CategoryOracle, S: OutputSink> StatementRunner<O, S> {
    /// Set up a run over `store`.
    ///
    /// Rules are validated here, before any run exists: a rule pointing outside
    /// the store's vocabulary fails with `UnknownCategory` and nothing is persisted.
    /// The ledger starts empty on every run.
    pub fn new(store: CategoryStore, rules: RuleSet, oracle: O, sink: S) -> Result<Self> {
        rules.validate(&store)?;

        Ok(Self {
            ledger: MonthlyLedger::for_store(&store),
            store,
            classifier: Classifier::new(rules, oracle),
            sink,
            interrupt: Interrupt::new(),
            summary: RunSummary::default(),
        })
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Process every statement file in `dir`, in directory-listing order
    pub fn run_dir(self, dir: &Path) -> Result<RunReport> {
        self.execute(|runner| {
            let statements = list_statements(dir)?;
            info!(
                "Found {} statement files in {}",
                statements.len(),
                dir.display()
            );
            runner.process(&statements)
        })
    }

    /// Process the given statement files in order
    pub fn run(self, statements: &[PathBuf]) -> Result<RunReport> {
        self.execute(|runner| runner.process(statements))
    }

    fn execute<F>(mut self, body: F) -> Result<RunReport>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let known_before = self.store.known_names();
        let processed = body(&mut self);
        self.summary.names_learned = self.store.known_names().saturating_sub(known_before);

        let finalized = self.finalize();

        match processed {
            Ok(()) => finalized?,
            Err(Error::Interrupted) if finalized.is_ok() => {
                warn!("Run interrupted, progress so far has been saved");
                self.summary.interrupted = true;
            }
            Err(e) => {
                if let Err(finalize_err) = finalized {
                    error!("Failed to save results: {}", finalize_err);
                }
                return Err(e);
            }
        }

        info!(
            "Processed {} files ({} failed): {} rows accumulated, {} skipped",
            self.summary.files_processed,
            self.summary.files_failed,
            self.summary.rows_accumulated,
            self.summary.rows_skipped
        );

        Ok(RunReport {
            summary: self.summary,
            store: self.store,
            ledger: self.ledger,
        })
    }

    fn process(&mut self, statements: &[PathBuf]) -> Result<()> {
        for path in statements {
            if self.interrupt.is_triggered() {
                return Err(Error::Interrupted);
            }

            match self.process_file(path) {
                Ok(()) => self.summary.files_processed += 1,
                Err(e) if !e.is_fatal() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    self.summary.files_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn process_file(&mut self, path: &Path) -> Result<()> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        info!("Processing {}", source);

        let rows = read_statement(path)?;

        let mut accumulated = Vec::with_capacity(rows.len());
        let processed = self.process_rows(rows, &source, &mut accumulated);

        // Rows already folded into the ledger are logged even when the file stops early
        let appended = if accumulated.is_empty() {
            Ok(())
        } else {
            self.sink.append_history(&accumulated)
        };

        match (processed, appended) {
            (Err(e), Err(append_err)) => {
                error!("Failed to append history for {}: {}", source, append_err);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), appended) => appended,
        }
    }

    fn process_rows(
        &mut self,
        rows: Vec<Result<TransactionRecord>>,
        source: &str,
        accumulated: &mut Vec<TransactionRecord>,
    ) -> Result<()> {
        for row in rows {
            if self.interrupt.is_triggered() {
                return Err(Error::Interrupted);
            }

            let mut record = match row {
                Ok(record) => record,
                Err(e) => {
                    warn!("{}: skipping row: {}", source, e);
                    self.summary.rows_skipped += 1;
                    continue;
                }
            };

            // Rows with no amount never reach the classifier
            if let Err(e) = ensure_amount(&record) {
                warn!("{}: skipping row: {}", source, e);
                self.summary.rows_skipped += 1;
                continue;
            }

            let classification = self
                .classifier
                .classify(&mut self.store, &mut record, source)?;
            self.summary.count(classification.source);

            let amount = match normalize_amount(&record, &classification.category) {
                Ok(amount) => amount,
                Err(e) if !e.is_fatal() => {
                    warn!("{}: skipping row: {}", source, e);
                    self.summary.rows_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.ledger
                .accumulate(&classification.category, record.month(), amount);
            self.summary.rows_accumulated += 1;
            accumulated.push(record);
        }
        Ok(())
    }

    /// Persist the store and both budgets, attempting all three
    fn finalize(&mut self) -> Result<()> {
        let results = [
            self.sink.write_category_cache(&self.store),
            self.sink.write_budget(&self.ledger),
            self.sink.write_budget_table(&self.ledger),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                error!("Failed to save output via {}: {}", self.sink.name(), e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
