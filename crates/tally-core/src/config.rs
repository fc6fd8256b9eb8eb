//! Configuration loading
//!
//! Configuration is TOML. Lookup order:
//! 1. An explicit path (CLI `--config`)
//! 2. `tally.toml` in the working directory
//! 3. `<data_local_dir>/tally/tally.toml`
//! 4. The embedded default (`config/tally.toml`)
//!
//! Relative paths inside a config file resolve against that file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::categories::{CategoryStore, LookupMode};
use crate::error::{Error, Result};
use crate::rules::{RuleSet, RuleSpec};
use crate::sink::OutputNames;

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

pub const CONFIG_FILE_NAME: &str = "tally.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory of statement CSV files
    pub statements_dir: PathBuf,
    /// Learned category mapping (JSON)
    pub category_cache: PathBuf,
    /// Where budgets and the history log are written
    pub output_dir: PathBuf,
    pub output_names: OutputNames,
    /// Categories per line in the console prompt
    pub grid_width: usize,
    pub lookup: LookupMode,
    pub rules: Vec<RuleSpec>,
    /// File the configuration came from (None for the embedded default)
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            statements_dir: PathBuf::from("statements"),
            category_cache: PathBuf::from("transaction_types.json"),
            output_dir: PathBuf::from("output"),
            output_names: OutputNames::default(),
            grid_width: 4,
            lookup: LookupMode::default(),
            rules: Vec::new(),
            source: None,
        }
    }
}

/// Per-user config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join(CONFIG_FILE_NAME))
}

impl Config {
    /// Load configuration, following the lookup order above
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_file(&local);
        }

        if let Some(user_path) = default_config_path() {
            if user_path.exists() {
                return Self::load_file(&user_path);
            }
        }

        debug!("Using embedded default configuration");
        Self::embedded(&std::env::current_dir()?)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };

        let mut config = parse_config(&content, &base_dir)?;
        config.source = Some(path.to_path_buf());
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The embedded default, with relative paths resolved against `base_dir`
    pub fn embedded(base_dir: &Path) -> Result<Self> {
        parse_config(DEFAULT_CONFIG, base_dir)
    }

    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::new(&self.rules)
    }

    /// Load the category cache with the configured lookup mode
    pub fn open_store(&self) -> Result<CategoryStore> {
        Ok(CategoryStore::load_file(&self.category_cache)?.with_lookup_mode(self.lookup))
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    input: Option<RawInput>,
    output: Option<RawOutput>,
    display: Option<RawDisplay>,
    classifier: Option<RawClassifier>,
    rules: Option<Vec<RuleSpec>>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    statements_dir: Option<PathBuf>,
    category_cache: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    output_dir: Option<PathBuf>,
    history_file: Option<String>,
    budget_file: Option<String>,
    budget_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    grid_width: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    lookup: Option<String>,
}

/// Parse config from TOML content
fn parse_config(content: &str, base_dir: &Path) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(input) = raw.input {
        if let Some(dir) = input.statements_dir {
            config.statements_dir = dir;
        }
        if let Some(cache) = input.category_cache {
            config.category_cache = cache;
        }
    }

    if let Some(output) = raw.output {
        if let Some(dir) = output.output_dir {
            config.output_dir = dir;
        }
        if let Some(name) = output.history_file {
            config.output_names.history_file = name;
        }
        if let Some(name) = output.budget_file {
            config.output_names.budget_file = name;
        }
        if let Some(name) = output.budget_json {
            config.output_names.budget_json = name;
        }
    }

    if let Some(display) = raw.display {
        if let Some(width) = display.grid_width {
            if width == 0 {
                return Err(Error::Config("display.grid_width must be at least 1".into()));
            }
            config.grid_width = width;
        }
    }

    if let Some(classifier) = raw.classifier {
        if let Some(lookup) = classifier.lookup {
            config.lookup = lookup.parse().map_err(Error::Config)?;
        }
    }

    if let Some(rules) = raw.rules {
        config.rules = rules;
    }

    config.statements_dir = resolve(base_dir, config.statements_dir);
    config.category_cache = resolve(base_dir, config.category_cache);
    config.output_dir = resolve(base_dir, config.output_dir);

    Ok(config)
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
