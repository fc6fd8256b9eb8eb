//! Heuristic classification rules
//!
//! Rules are data: a name pattern, an optional amount predicate, and the
//! category to assign. They are evaluated in declaration order and the first
//! match wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryStore;
use crate::error::{Error, Result};

/// How a rule's pattern is compared against a transaction name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring; `|` separates alternatives
    #[default]
    Contains,
    /// Case-insensitive equality
    Exact,
    Regex,
}

/// A rule as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub pattern_type: PatternType,
    pub category: String,
    /// Match only when the amount is at most this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    /// Match only when the amount equals this value (to the cent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_equals: Option<f64>,
}

impl RuleSpec {
    pub fn contains(pattern: &str, category: &str) -> Self {
        Self {
            label: None,
            pattern: pattern.to_string(),
            pattern_type: PatternType::Contains,
            category: category.to_string(),
            max_amount: None,
            amount_equals: None,
        }
    }
}

#[derive(Debug)]
enum Matcher {
    Contains(Vec<String>),
    Exact(String),
    Regex(Regex),
}

impl Matcher {
    fn matches(&self, name: &str) -> bool {
        let name_upper = name.to_uppercase();
        match self {
            Self::Contains(needles) => needles.iter().any(|n| name_upper.contains(n.as_str())),
            Self::Exact(expected) => name_upper.trim() == expected.as_str(),
            Self::Regex(re) => re.is_match(name) || re.is_match(&name_upper),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AmountPredicate {
    Any,
    AtMost(f64),
    Equals(f64),
}

impl AmountPredicate {
    fn matches(&self, amount: Option<f64>) -> bool {
        match (self, amount) {
            (Self::Any, _) => true,
            (Self::AtMost(limit), Some(amount)) => amount <= *limit,
            (Self::Equals(expected), Some(amount)) => (amount - expected).abs() < 0.005,
            (_, None) => false,
        }
    }
}

/// A compiled heuristic rule
#[derive(Debug)]
pub struct HeuristicRule {
    label: String,
    matcher: Matcher,
    amount: AmountPredicate,
    category: String,
}

impl HeuristicRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let amount = match (spec.max_amount, spec.amount_equals) {
            (None, None) => AmountPredicate::Any,
            (Some(limit), None) => AmountPredicate::AtMost(limit),
            (None, Some(expected)) => AmountPredicate::Equals(expected),
            (Some(_), Some(_)) => {
                return Err(Error::Config(format!(
                    "Rule '{}' sets both max_amount and amount_equals",
                    spec.pattern
                )))
            }
        };

        let matcher = match spec.pattern_type {
            PatternType::Contains => Matcher::Contains(
                spec.pattern
                    .split('|')
                    .map(|p| p.trim().to_uppercase())
                    .filter(|p| !p.is_empty())
                    .collect(),
            ),
            PatternType::Exact => Matcher::Exact(spec.pattern.trim().to_uppercase()),
            PatternType::Regex => Matcher::Regex(Regex::new(&spec.pattern)?),
        };

        let label = spec
            .label
            .clone()
            .unwrap_or_else(|| format!("{} → {}", spec.pattern, spec.category));

        Ok(Self {
            label,
            matcher,
            amount,
            category: spec.category.clone(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn matches(&self, name: &str, amount: Option<f64>) -> bool {
        self.matcher.matches(name) && self.amount.matches(amount)
    }
}

/// Ordered list of heuristic rules
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<HeuristicRule>,
}

impl RuleSet {
    pub fn new(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(HeuristicRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Every rule must point at a category the store knows about
    pub fn validate(&self, store: &CategoryStore) -> Result<()> {
        match self
            .rules
            .iter()
            .find(|rule| !store.contains_category(&rule.category))
        {
            Some(rule) => Err(Error::UnknownCategory(format!(
                "{} (used by rule '{}')",
                rule.category, rule.label
            ))),
            None => Ok(()),
        }
    }

    /// First rule matching the name and amount, in declaration order
    pub fn first_match(&self, name: &str, amount: Option<f64>) -> Option<&HeuristicRule> {
        self.rules.iter().find(|rule| rule.matches(name, amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeuristicRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
