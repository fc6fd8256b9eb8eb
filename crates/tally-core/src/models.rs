//! Domain models for Tally

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reserved bucket for transactions the oracle could not classify
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Category whose credits count as positive money in
pub const INCOME_CATEGORY: &str = "Income";

/// Calendar month used as the ledger's time bucket
///
/// Variants are declared in calendar order, so `Ord` sorts Jan..Dec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Self::Jan,
        Self::Feb,
        Self::Mar,
        Self::Apr,
        Self::May,
        Self::Jun,
        Self::Jul,
        Self::Aug,
        Self::Sep,
        Self::Oct,
        Self::Nov,
        Self::Dec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jan => "Jan",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::May => "May",
            Self::Jun => "Jun",
            Self::Jul => "Jul",
            Self::Aug => "Aug",
            Self::Sep => "Sep",
            Self::Oct => "Oct",
            Self::Nov => "Nov",
            Self::Dec => "Dec",
        }
    }

    /// Month bucket for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        // month0() is always 0..=11
        Self::ALL[date.month0() as usize]
    }
}

impl std::str::FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown month: {}", s))
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single parsed statement row
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    /// Free-text description, the join key for classification
    pub name: String,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub running_balance: Option<f64>,
    /// Assigned once by the classifier
    pub category: Option<String>,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            debit: None,
            credit: None,
            running_balance: None,
            category: None,
        }
    }

    pub fn with_debit(mut self, amount: f64) -> Self {
        self.debit = Some(amount);
        self
    }

    pub fn with_credit(mut self, amount: f64) -> Self {
        self.credit = Some(amount);
        self
    }

    pub fn month(&self) -> Month {
        Month::from_date(self.date)
    }

    /// Unsigned amount used by rule predicates: debit if present, else credit
    pub fn magnitude(&self) -> Option<f64> {
        self.debit.or(self.credit)
    }

    /// Record the resolved category. Returns false if one was already assigned.
    pub fn assign_category(&mut self, category: &str) -> bool {
        if self.category.is_some() {
            return false;
        }
        self.category = Some(category.to_string());
        true
    }

    pub fn context<'a>(&'a self, source: &'a str) -> TransactionContext<'a> {
        TransactionContext {
            name: &self.name,
            date: self.date,
            debit: self.debit,
            credit: self.credit,
            source,
        }
    }
}

/// What the oracle is shown when asked to classify a transaction
#[derive(Debug, Clone, Copy)]
pub struct TransactionContext<'a> {
    pub name: &'a str,
    pub date: NaiveDate,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    /// Statement file the row came from
    pub source: &'a str,
}

/// Which layer of the classifier resolved a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// Previously learned transaction name
    Learned,
    /// Heuristic rule (auto-learned)
    Rule,
    /// Answered by the oracle (auto-learned)
    Oracle,
    /// Oracle cancelled or gave an invalid answer; bucketed as Unknown
    Unresolved,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::Rule => "rule",
            Self::Oracle => "oracle",
            Self::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: String,
    pub source: ClassificationSource,
    /// Label of the heuristic rule that matched (rule source only)
    pub rule: Option<String>,
}

impl Classification {
    pub fn new(category: impl Into<String>, source: ClassificationSource) -> Self {
        Self {
            category: category.into(),
            source,
            rule: None,
        }
    }

    pub fn unresolved() -> Self {
        Self::new(UNKNOWN_CATEGORY, ClassificationSource::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_from_date_all_months() {
        let expected = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        for (i, label) in expected.iter().enumerate() {
            let month = Month::from_date(date(2023, i as u32 + 1, 15));
            assert_eq!(month.as_str(), *label);
            assert_eq!(label.parse::<Month>().unwrap(), month);
        }
    }

    #[test]
    fn test_month_boundary_dates() {
        assert_eq!(Month::from_date(date(2023, 12, 25)), Month::Dec);
        assert_eq!(Month::from_date(date(2023, 12, 31)), Month::Dec);
        assert_eq!(Month::from_date(date(2024, 1, 1)), Month::Jan);
        assert_eq!(Month::from_date(date(2024, 2, 29)), Month::Feb);
    }

    #[test]
    fn test_month_parse_is_case_insensitive() {
        assert_eq!("jul".parse::<Month>().unwrap(), Month::Jul);
        assert!("July".parse::<Month>().is_err());
    }

    #[test]
    fn test_months_sort_in_calendar_order() {
        let mut months = vec![Month::Dec, Month::Apr, Month::Jan, Month::Aug];
        months.sort();
        assert_eq!(months, vec![Month::Jan, Month::Apr, Month::Aug, Month::Dec]);
    }

    #[test]
    fn test_month_serializes_as_short_label() {
        assert_eq!(serde_json::to_string(&Month::Sep).unwrap(), "\"Sep\"");
    }

    #[test]
    fn test_category_assigned_once() {
        let mut record = TransactionRecord::new(date(2023, 7, 15), "FORTINOS").with_debit(45.20);
        assert!(record.assign_category("Groceries"));
        assert!(!record.assign_category("House Purchases"));
        assert_eq!(record.category.as_deref(), Some("Groceries"));
    }

    #[test]
    fn test_magnitude_prefers_debit() {
        let record = TransactionRecord::new(date(2023, 7, 15), "X")
            .with_debit(30.0)
            .with_credit(50.0);
        assert_eq!(record.magnitude(), Some(30.0));

        let record = TransactionRecord::new(date(2023, 7, 15), "X").with_credit(50.0);
        assert_eq!(record.magnitude(), Some(50.0));
    }
}
