//! Category store: the learned category → transaction-name mapping
//!
//! The vocabulary of categories is fixed when the store is built; only the
//! sets of known names grow during a run. Categories iterate in sorted order,
//! which is both the "first match wins" order for lookups and the order the
//! vocabulary is presented to the oracle.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::UNKNOWN_CATEGORY;

/// How `lookup` compares an incoming name against known names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Case-sensitive equality with a known name
    #[default]
    Exact,
    /// The incoming name appears inside a known name
    Substring,
}

impl std::str::FromStr for LookupMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "substring" | "contains" => Ok(Self::Substring),
            _ => Err(format!("Unknown lookup mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStore {
    categories: BTreeMap<String, BTreeSet<String>>,
    mode: LookupMode,
}

impl CategoryStore {
    /// Build a store from (category, known names) pairs.
    ///
    /// The reserved `Unknown` bucket is added if missing.
    pub fn from_categories<I, N>(categories: I) -> Self
    where
        I: IntoIterator<Item = (String, N)>,
        N: IntoIterator<Item = String>,
    {
        let mut categories: BTreeMap<String, BTreeSet<String>> = categories
            .into_iter()
            .map(|(category, names)| (category, names.into_iter().collect()))
            .collect();

        if !categories.contains_key(UNKNOWN_CATEGORY) {
            info!("Category cache has no '{}' bucket, adding it", UNKNOWN_CATEGORY);
            categories.insert(UNKNOWN_CATEGORY.to_string(), BTreeSet::new());
        }

        Self {
            categories,
            mode: LookupMode::default(),
        }
    }

    /// Parse a persisted JSON mapping of category → list of names
    pub fn load<R: Read>(source: R) -> Result<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_reader(source)
            .map_err(|e| Error::MalformedCache(e.to_string()))?;
        let store = Self::from_categories(raw);
        debug!(
            "Loaded {} categories with {} known transaction names",
            store.len(),
            store.known_names()
        );
        Ok(store)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::MalformedCache(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::load(BufReader::new(file))
    }

    pub fn with_lookup_mode(mut self, mode: LookupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn lookup_mode(&self) -> LookupMode {
        self.mode
    }

    /// Find the category that already knows this transaction name
    pub fn lookup(&self, transaction_name: &str) -> Option<&str> {
        let exact = self
            .categories
            .iter()
            .find(|(_, names)| names.contains(transaction_name))
            .map(|(category, _)| category.as_str());

        match self.mode {
            LookupMode::Exact => exact,
            // Exact hits win over containment
            LookupMode::Substring => exact.or_else(|| {
                // An empty needle is contained in everything
                if transaction_name.is_empty() {
                    return None;
                }
                self.categories
                    .iter()
                    .find(|(_, names)| names.iter().any(|known| known.contains(transaction_name)))
                    .map(|(category, _)| category.as_str())
            }),
        }
    }

    /// Remember `transaction_name` under `category`.
    ///
    /// Returns `Ok(true)` if the name was newly added.
    pub fn learn(&mut self, category: &str, transaction_name: &str) -> Result<bool> {
        let names = self
            .categories
            .get_mut(category)
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))?;

        if transaction_name.is_empty() {
            return Ok(false);
        }

        let added = names.insert(transaction_name.to_string());
        if added {
            debug!("Learned '{}' as {}", transaction_name, category);
        }
        Ok(added)
    }

    /// Write the mapping as pretty JSON (4-space indent, sorted keys)
    pub fn persist<W: Write>(&self, sink: W) -> Result<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(sink, formatter);
        self.categories.serialize(&mut serializer)?;
        Ok(())
    }

    /// Category names in presentation order
    pub fn vocabulary(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.categories.iter().map(|(c, n)| (c.as_str(), n))
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of known transaction names across all categories
    pub fn known_names(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }
}
