//! Monthly ledger: running signed totals per category per month

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::Serialize;

use crate::categories::CategoryStore;
use crate::error::{Error, Result};
use crate::models::Month;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyLedger {
    totals: BTreeMap<String, BTreeMap<Month, f64>>,
}

impl MonthlyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger with an entry for every category in the store
    pub fn for_store(store: &CategoryStore) -> Self {
        Self {
            totals: store
                .vocabulary()
                .into_iter()
                .map(|category| (category.to_string(), BTreeMap::new()))
                .collect(),
        }
    }

    /// Add `signed_amount` to the (category, month) cell, starting from zero
    pub fn accumulate(&mut self, category: &str, month: Month, signed_amount: f64) {
        *self
            .totals
            .entry(category.to_string())
            .or_default()
            .entry(month)
            .or_insert(0.0) += signed_amount;
    }

    pub fn total(&self, category: &str, month: Month) -> Option<f64> {
        self.totals.get(category)?.get(&month).copied()
    }

    /// Sum over all months for one category
    pub fn category_total(&self, category: &str) -> f64 {
        self.totals
            .get(category)
            .map(|months| months.values().sum())
            .unwrap_or(0.0)
    }

    /// Sum over all categories for one month
    pub fn month_total(&self, month: Month) -> f64 {
        self.totals
            .values()
            .filter_map(|months| months.get(&month))
            .sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }

    pub fn months(&self, category: &str) -> Option<&BTreeMap<Month, f64>> {
        self.totals.get(category)
    }

    /// Parse a structured budget written by `persist_structured`
    pub fn load<R: Read>(source: R) -> Result<Self> {
        let totals: BTreeMap<String, BTreeMap<Month, f64>> = serde_json::from_reader(source)
            .map_err(|e| Error::InvalidBudget(e.to_string()))?;
        Ok(Self { totals })
    }

    /// Nested JSON mapping: categories sorted, months in calendar order
    pub fn persist_structured<W: Write>(&self, sink: W) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(sink, formatter);
        self.totals.serialize(&mut serializer)?;
        Ok(())
    }

    /// CSV grid: `Category,Jan,...,Dec`, one row per category, empty cells for no activity
    pub fn persist_tabular<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);

        let mut header = vec!["Category"];
        header.extend(Month::ALL.iter().map(Month::as_str));
        writer.write_record(&header)?;

        for (category, months) in &self.totals {
            let mut row = vec![category.clone()];
            row.extend(
                Month::ALL
                    .iter()
                    .map(|m| months.get(m).map(|v| format_amount(*v)).unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Two decimals, with negative zero printed as zero
fn format_amount(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    if rounded == "-0.00" {
        "0.00".to_string()
    } else {
        rounded
    }
}
