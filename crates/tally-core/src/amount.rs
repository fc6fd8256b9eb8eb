//! Sign normalization for ledger amounts
//!
//! Debits are spending and add to a category's total. Credits are refunds or
//! reversals and reduce it, except for income, where the credit is the income
//! itself and adds.

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{TransactionRecord, INCOME_CATEGORY};

/// Signed amount to add to the ledger for a record resolved to `category`
pub fn normalize_amount(record: &TransactionRecord, category: &str) -> Result<f64> {
    match (record.debit, record.credit) {
        (Some(debit), credit) => {
            if credit.is_some() {
                warn!(
                    "Both debit and credit set for '{}' on {}, using debit",
                    record.name, record.date
                );
            }
            Ok(debit)
        }
        (None, Some(credit)) if category == INCOME_CATEGORY => Ok(credit),
        (None, Some(credit)) => Ok(-credit),
        (None, None) => Err(ambiguous(record)),
    }
}

/// Fails with `AmbiguousAmount` when the record has neither a debit nor a credit
pub fn ensure_amount(record: &TransactionRecord) -> Result<()> {
    match record.magnitude() {
        Some(_) => Ok(()),
        None => Err(ambiguous(record)),
    }
}

fn ambiguous(record: &TransactionRecord) -> Error {
    Error::AmbiguousAmount {
        name: record.name.clone(),
        date: record.date.to_string(),
    }
}
