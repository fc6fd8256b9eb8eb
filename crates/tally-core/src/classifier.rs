//! Transaction classifier
//!
//! Resolves each transaction to a category with a layered policy:
//! learned names → heuristic rules → the categorization oracle. Rule and
//! oracle answers are learned back into the category store so the next
//! occurrence of the same name resolves from the cache.

use tracing::{debug, info, warn};

use crate::categories::CategoryStore;
use crate::error::{Error, Result};
use crate::models::{
    Classification, ClassificationSource, TransactionContext, TransactionRecord, UNKNOWN_CATEGORY,
};
use crate::rules::RuleSet;

/// Answer from the categorization oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleAnswer {
    /// Index into the vocabulary that was offered
    Choice(usize),
    /// The oracle declined to pick a category for this transaction
    Cancelled,
    /// The user asked to stop the whole run
    Interrupted,
}

/// External decision-maker consulted when nothing else classifies a transaction
pub trait CategoryOracle {
    fn ask_category(
        &mut self,
        context: &TransactionContext<'_>,
        vocabulary: &[&str],
    ) -> OracleAnswer;
}

impl<T: CategoryOracle + ?Sized> CategoryOracle for &mut T {
    fn ask_category(
        &mut self,
        context: &TransactionContext<'_>,
        vocabulary: &[&str],
    ) -> OracleAnswer {
        (**self).ask_category(context, vocabulary)
    }
}

impl<T: CategoryOracle + ?Sized> CategoryOracle for Box<T> {
    fn ask_category(
        &mut self,
        context: &TransactionContext<'_>,
        vocabulary: &[&str],
    ) -> OracleAnswer {
        (**self).ask_category(context, vocabulary)
    }
}

pub struct Classifier<O> {
    rules: RuleSet,
    oracle: O,
}

impl<O: CategoryOracle> Classifier<O> {
    pub fn new(rules: RuleSet, oracle: O) -> Self {
        Self { rules, oracle }
    }

    /// Resolve `record` to a category and assign it.
    ///
    /// `source` names the statement the row came from and is shown to the oracle.
    /// Fails with `Interrupted` if the oracle reports an interrupt, and with
    /// `UnknownCategory` if a rule points outside the vocabulary.
    pub fn classify(
        &mut self,
        store: &mut CategoryStore,
        record: &mut TransactionRecord,
        source: &str,
    ) -> Result<Classification> {
        let classification = self.resolve(store, record, source)?;
        record.assign_category(&classification.category);
        Ok(classification)
    }

    fn resolve(
        &mut self,
        store: &mut CategoryStore,
        record: &TransactionRecord,
        source: &str,
    ) -> Result<Classification> {
        let name = record.name.as_str();

        // 1. Previously learned name
        if let Some(category) = store.lookup(name) {
            debug!("Found transaction '{}' as {}", name, category);
            return Ok(Classification::new(category, ClassificationSource::Learned));
        }

        // 2. Heuristic rules, learned back on match
        if let Some(rule) = self.rules.first_match(name, record.magnitude()) {
            debug!(
                "Rule '{}' matched '{}': {}",
                rule.label(),
                name,
                rule.category()
            );
            store.learn(rule.category(), name)?;
            return Ok(Classification {
                category: rule.category().to_string(),
                source: ClassificationSource::Rule,
                rule: Some(rule.label().to_string()),
            });
        }

        // 3. Ask the oracle
        info!(
            "Unclassified transaction: {} | debit: {} | credit: {} | date: {} | file: {}",
            name,
            display_amount(record.debit),
            display_amount(record.credit),
            record.date,
            source
        );

        let chosen = {
            let vocabulary = store.vocabulary();
            match self
                .oracle
                .ask_category(&record.context(source), &vocabulary)
            {
                OracleAnswer::Choice(index) => match vocabulary.get(index) {
                    Some(category) => Some(category.to_string()),
                    None => {
                        warn!(
                            "Choice {} doesn't correspond to a category, leaving '{}' as {}",
                            index, name, UNKNOWN_CATEGORY
                        );
                        None
                    }
                },
                OracleAnswer::Cancelled => {
                    warn!(
                        "Classification cancelled, leaving '{}' as {}",
                        name, UNKNOWN_CATEGORY
                    );
                    None
                }
                OracleAnswer::Interrupted => return Err(Error::Interrupted),
            }
        };

        match chosen {
            Some(category) => {
                // Picking the Unknown bucket is not remembered, so the name is asked again next time
                if category != UNKNOWN_CATEGORY {
                    store.learn(&category, name)?;
                }
                info!("Creating new entry for '{}' in {}", name, category);
                Ok(Classification::new(category, ClassificationSource::Oracle))
            }
            None => Ok(Classification::unresolved()),
        }
    }
}

/// Dry run of the learned and rule layers
pub fn preview(
    store: &CategoryStore,
    rules: &RuleSet,
    name: &str,
    amount: Option<f64>,
) -> Option<Classification> {
    if let Some(category) = store.lookup(name) {
        return Some(Classification::new(category, ClassificationSource::Learned));
    }

    rules.first_match(name, amount).map(|rule| Classification {
        category: rule.category().to_string(),
        source: ClassificationSource::Rule,
        rule: Some(rule.label().to_string()),
    })
}

fn display_amount(amount: Option<f64>) -> String {
    amount
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "-".to_string())
}
