//! Category cache listing

use anyhow::{Context, Result};
use tally_core::Config;

use super::truncate;

pub fn cmd_categories(config: &Config) -> Result<()> {
    let store = config.open_store().with_context(|| {
        format!(
            "Failed to load category cache: {}",
            config.category_cache.display()
        )
    })?;

    println!();
    println!("🏷️  Categories ({})", config.category_cache.display());
    println!("   ─────────────────────────────────────────────────────────────");

    for (index, (category, names)) in store.iter().enumerate() {
        println!("   {:>3}. {:<30} {:>5} names", index, category, names.len());
    }

    println!();
    println!(
        "   {} categories, {} known transaction names (lookup: {:?})",
        store.len(),
        store.known_names(),
        store.lookup_mode()
    );

    let rules = config.rule_set().context("Invalid heuristic rules")?;
    if rules.is_empty() {
        return Ok(());
    }

    println!();
    println!("📏 Heuristic rules ({}, first match wins)", rules.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for rule in rules.iter() {
        let marker = if store.contains_category(rule.category()) {
            ""
        } else {
            "  ⚠️  not in cache"
        };
        println!(
            "   {:<30} -> {}{}",
            truncate(rule.label(), 30),
            rule.category(),
            marker
        );
    }

    Ok(())
}
