//! Test utilities for tally-core
//!
//! A scripted oracle that replays canned answers and an in-memory sink that
//! records everything a run writes.

use std::collections::VecDeque;

use crate::categories::CategoryStore;
use crate::classifier::{CategoryOracle, OracleAnswer};
use crate::error::{Error, Result};
use crate::ledger::MonthlyLedger;
use crate::models::{TransactionContext, TransactionRecord};
use crate::sink::OutputSink;

/// Oracle that answers from a script, then cancels once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: VecDeque<OracleAnswer>,
    names: Vec<String>,
    vocabularies: Vec<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(answers: Vec<OracleAnswer>) -> Self {
        Self {
            answers: answers.into(),
            ..Self::default()
        }
    }

    /// Number of times the oracle was consulted
    pub fn asked(&self) -> usize {
        self.names.len()
    }

    /// Transaction names the oracle was asked about, in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Vocabulary offered on each call
    pub fn vocabularies(&self) -> &[Vec<String>] {
        &self.vocabularies
    }
}

impl CategoryOracle for ScriptedOracle {
    fn ask_category(
        &mut self,
        context: &TransactionContext<'_>,
        vocabulary: &[&str],
    ) -> OracleAnswer {
        self.names.push(context.name.to_string());
        self.vocabularies
            .push(vocabulary.iter().map(|c| c.to_string()).collect());
        self.answers.pop_front().unwrap_or(OracleAnswer::Cancelled)
    }
}

/// Sink that keeps the last written state in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub cache: Option<CategoryStore>,
    pub budget: Option<MonthlyLedger>,
    /// Rendered `Category,Jan,...,Dec` grid
    pub budget_table: Option<String>,
    pub history: Vec<TransactionRecord>,
    pub cache_writes: usize,
    pub budget_writes: usize,
    pub table_writes: usize,
    /// Number of `append_history` calls (one per statement with accumulated rows)
    pub history_appends: usize,
    fail_history: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every history append fail, to exercise fatal sink errors
    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }
}

impl OutputSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_category_cache(&mut self, store: &CategoryStore) -> Result<()> {
        self.cache = Some(store.clone());
        self.cache_writes += 1;
        Ok(())
    }

    fn write_budget(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        self.budget = Some(ledger.clone());
        self.budget_writes += 1;
        Ok(())
    }

    fn write_budget_table(&mut self, ledger: &MonthlyLedger) -> Result<()> {
        let mut out = Vec::new();
        ledger.persist_tabular(&mut out)?;
        self.budget_table =
            Some(String::from_utf8(out).map_err(|e| Error::Output(e.to_string()))?);
        self.table_writes += 1;
        Ok(())
    }

    fn append_history(&mut self, records: &[TransactionRecord]) -> Result<()> {
        if self.fail_history {
            return Err(Error::Output("history log unavailable".into()));
        }
        self.history.extend_from_slice(records);
        self.history_appends += 1;
        Ok(())
    }
}
