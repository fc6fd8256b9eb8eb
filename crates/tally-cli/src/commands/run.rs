//! Statement pipeline command

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use tally_core::{
    CategoryOracle, Config, FileSink, Interrupt, RunReport, RunSummary, StatementRunner,
};
use tracing::warn;

use crate::oracle::ConsoleOracle;

/// Command-line paths take precedence over the config file
pub fn apply_overrides(
    mut config: Config,
    statements: Option<PathBuf>,
    cache: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Config {
    if let Some(dir) = statements {
        config.statements_dir = dir;
    }
    if let Some(path) = cache {
        config.category_cache = path;
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    config
}

/// Where a run wrote its outputs
#[derive(Debug, Clone)]
pub struct RunOutputs {
    pub category_cache: PathBuf,
    pub budget_json: PathBuf,
    pub budget_table: PathBuf,
    pub history: PathBuf,
}

/// Run the pipeline synchronously with the given oracle
pub fn run_pipeline<O: CategoryOracle>(
    config: &Config,
    oracle: O,
    interrupt: Interrupt,
    run_started: NaiveDateTime,
) -> Result<(RunReport, RunOutputs)> {
    let store = config.open_store().with_context(|| {
        format!(
            "Failed to load category cache: {}",
            config.category_cache.display()
        )
    })?;
    let rules = config.rule_set().context("Invalid heuristic rules")?;

    let sink = FileSink::new(
        &config.category_cache,
        &config.output_dir,
        &config.output_names,
        run_started,
    )?;
    let outputs = RunOutputs {
        category_cache: sink.category_cache_path().to_path_buf(),
        budget_json: sink.budget_json_path().to_path_buf(),
        budget_table: sink.budget_table_path().to_path_buf(),
        history: sink.history_path().to_path_buf(),
    };

    let report = StatementRunner::new(store, rules, oracle, sink)?
        .with_interrupt(interrupt)
        .run_dir(&config.statements_dir)
        .with_context(|| {
            format!(
                "Failed to process statements in {}",
                config.statements_dir.display()
            )
        })?;

    Ok((report, outputs))
}

pub async fn cmd_run(config: Config, json: bool) -> Result<()> {
    let interrupt = Interrupt::new();

    // Ctrl-C flips the flag; the runner stops at the next row or prompt and still saves
    let watcher = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, saving progress...");
                interrupt.trigger();
            }
        })
    };

    if !json {
        println!("📂 Reading statements from {}", config.statements_dir.display());
    }

    let run_started = Local::now().naive_local();
    let result = tokio::task::spawn_blocking(move || {
        let oracle = ConsoleOracle::stdin(config.grid_width, interrupt.clone());
        run_pipeline(&config, oracle, interrupt, run_started)
    })
    .await
    .context("Statement pipeline panicked")?;
    watcher.abort();

    let (report, outputs) = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print_summary(&report, &outputs);
    }

    Ok(())
}

fn print_summary(report: &RunReport, outputs: &RunOutputs) {
    let RunSummary {
        files_processed,
        files_failed,
        rows_accumulated,
        rows_skipped,
        learned_matches,
        rule_matches,
        oracle_answers,
        unresolved,
        names_learned,
        interrupted,
    } = &report.summary;

    println!();
    if *interrupted {
        println!("⚠️  Run interrupted, progress saved");
    } else {
        println!("✅ Run complete!");
    }
    println!("   Files processed: {}", files_processed);
    if *files_failed > 0 {
        println!("   Files skipped (unreadable): {}", files_failed);
    }
    println!("   Rows accumulated: {}", rows_accumulated);
    if *rows_skipped > 0 {
        println!("   Rows skipped: {}", rows_skipped);
    }
    println!("   - From learned names: {}", learned_matches);
    println!("   - By rule: {}", rule_matches);
    println!("   - By you: {}", oracle_answers);
    if *unresolved > 0 {
        println!("   - Left as Unknown: {}", unresolved);
    }
    println!("   New names learned: {}", names_learned);

    println!();
    println!("💰 Monthly totals");
    println!("   ─────────────────────────────────────────────────────────────");
    for category in report.ledger.categories() {
        let total = report.ledger.category_total(category);
        if total != 0.0 {
            println!("   {:<30} {:>12.2}", super::truncate(category, 30), total);
        }
    }

    println!();
    println!("📝 Outputs");
    println!("   Category cache: {}", outputs.category_cache.display());
    println!("   Budget: {}", outputs.budget_table.display());
    println!("   Budget (JSON): {}", outputs.budget_json.display());
    println!("   History: {}", outputs.history.display());
}
