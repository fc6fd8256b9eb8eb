//! Dry-run classification of a transaction name

use anyhow::{Context, Result};
use tally_core::classifier::preview;
use tally_core::{Classification, ClassificationSource, Config};

/// Learned names first, then rules. Nothing is learned and no prompt is shown.
pub fn preview_name(config: &Config, name: &str, amount: Option<f64>) -> Result<Option<Classification>> {
    let store = config.open_store().with_context(|| {
        format!(
            "Failed to load category cache: {}",
            config.category_cache.display()
        )
    })?;
    let rules = config.rule_set().context("Invalid heuristic rules")?;
    rules.validate(&store)?;

    Ok(preview(&store, &rules, name, amount))
}

pub fn cmd_classify(config: &Config, name: &str, amount: Option<f64>) -> Result<()> {
    match preview_name(config, name, amount)? {
        Some(Classification {
            category,
            source: ClassificationSource::Learned,
            ..
        }) => {
            println!("🔍 \"{}\" is already known as {}", name, category);
        }
        Some(Classification {
            category,
            rule: Some(rule),
            ..
        }) => {
            println!("🔍 \"{}\" -> {} (rule: {})", name, category, rule);
        }
        Some(classification) => {
            println!("🔍 \"{}\" -> {}", name, classification.category);
        }
        None => {
            println!(
                "No learned name or rule matches \"{}\"; a run would ask you",
                name
            );
        }
    }

    Ok(())
}
