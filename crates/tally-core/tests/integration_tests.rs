//! Integration tests for tally-core
//!
//! These tests exercise the full statements → classify → ledger → outputs workflow.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tally_core::{
    statement::list_statements,
    test_utils::{MemorySink, ScriptedOracle},
    CategoryStore, Config, Error, FileSink, Month, MonthlyLedger, OracleAnswer, OutputNames,
    RuleSet, RuleSpec, StatementRunner,
};
use tempfile::TempDir;

/// The store used by the end-to-end scenarios
fn scenario_store() -> CategoryStore {
    CategoryStore::load(r#"{"Groceries": ["FORTINOS"], "Income": [], "Unknown": []}"#.as_bytes())
        .expect("Failed to load scenario store")
}

fn write_statement(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write statement");
    path
}

fn run_started() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_scenario_learned_grocery_purchase() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(dir.path(), "july.csv", "2023-07-15,FORTINOS,45.20,NaN,\n");

    let mut oracle = ScriptedOracle::new(vec![]);
    let mut sink = MemorySink::new();
    let report = StatementRunner::new(scenario_store(), RuleSet::empty(), &mut oracle, &mut sink)
        .unwrap()
        .run(&[path])
        .unwrap();

    assert_eq!(report.ledger.total("Groceries", Month::Jul), Some(45.2));
    assert_eq!(report.ledger.category_total("Groceries"), 45.2);
    assert_eq!(report.ledger.month_total(Month::Jul), 45.2);
    assert_eq!(oracle.asked(), 0);

    assert_eq!(sink.history.len(), 1);
    assert_eq!(sink.history[0].category.as_deref(), Some("Groceries"));
    assert_eq!(sink.cache.as_ref(), Some(&scenario_store()));
}

#[test]
fn test_scenario_income_credit_via_oracle() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(
        dir.path(),
        "january.csv",
        "2023-01-02,PAYROLL DEPOSIT,NaN,2500.00,\n",
    );

    // Vocabulary: Groceries, Income, Unknown
    let oracle = ScriptedOracle::new(vec![OracleAnswer::Choice(1)]);
    let report = StatementRunner::new(scenario_store(), RuleSet::empty(), oracle, MemorySink::new())
        .unwrap()
        .run(&[path])
        .unwrap();

    assert_eq!(report.ledger.total("Income", Month::Jan), Some(2500.0));
    assert_eq!(report.store.lookup("PAYROLL DEPOSIT"), Some("Income"));
    assert_eq!(report.summary.names_learned, 1);
}

#[test]
fn test_scenario_income_credit_via_rule() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(
        dir.path(),
        "january.csv",
        "2023-01-02,PAYROLL DEPOSIT,NaN,2500.00,\n",
    );

    let rules = RuleSet::new(&[RuleSpec::contains("PAYROLL", "Income")]).unwrap();
    let report = StatementRunner::new(
        scenario_store(),
        rules,
        ScriptedOracle::new(vec![]),
        MemorySink::new(),
    )
    .unwrap()
    .run(&[path])
    .unwrap();

    assert_eq!(report.ledger.total("Income", Month::Jan), Some(2500.0));
    assert_eq!(report.summary.rule_matches, 1);
}

#[test]
fn test_scenario_cancelled_oracle_goes_to_unknown() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(
        dir.path(),
        "march.csv",
        "2023-03-04,CORNER STORE,,18.50,\n2023-03-05,CORNER STORE,7.25,,\n",
    );

    let oracle = ScriptedOracle::new(vec![OracleAnswer::Cancelled, OracleAnswer::Cancelled]);
    let report = StatementRunner::new(scenario_store(), RuleSet::empty(), oracle, MemorySink::new())
        .unwrap()
        .run(&[path])
        .expect("Cancellation must not abort the run");

    // No mutation to the store
    assert_eq!(report.store, scenario_store());
    // A credit outside Income reduces the bucket, the debit adds to it
    assert_eq!(report.ledger.total("Unknown", Month::Mar), Some(-18.5 + 7.25));
    assert_eq!(report.summary.unresolved, 2);
    assert!(!report.summary.interrupted);
}

// =============================================================================
// Runner behaviour
// =============================================================================

#[test]
fn test_directory_order_preserved() {
    let dir = TempDir::new().unwrap();
    for name in ["c.csv", "a.csv", "b.csv"] {
        let row = format!("2023-05-01,SHOP {},1.00,,\n", name);
        write_statement(dir.path(), name, &row);
    }

    let listed = list_statements(dir.path()).unwrap();
    let expected: Vec<String> = listed
        .iter()
        .map(|p| format!("SHOP {}", p.file_name().unwrap().to_string_lossy()))
        .collect();

    let mut oracle = ScriptedOracle::new(vec![]);
    StatementRunner::new(scenario_store(), RuleSet::empty(), &mut oracle, MemorySink::new())
        .unwrap()
        .run_dir(dir.path())
        .unwrap();

    assert_eq!(oracle.names(), expected.as_slice());
}

#[test]
fn test_unreadable_file_does_not_stop_run() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.csv");
    let good = write_statement(dir.path(), "good.csv", "2023-07-15,FORTINOS,45.20,,\n");

    let report = StatementRunner::new(
        scenario_store(),
        RuleSet::empty(),
        ScriptedOracle::new(vec![]),
        MemorySink::new(),
    )
    .unwrap()
    .run(&[missing, good])
    .unwrap();

    assert_eq!(report.summary.files_failed, 1);
    assert_eq!(report.summary.files_processed, 1);
    assert_eq!(report.ledger.total("Groceries", Month::Jul), Some(45.2));
}

#[test]
fn test_interrupt_still_persists_progress() {
    let dir = TempDir::new().unwrap();
    let statements = dir.path().join("statements");
    fs::create_dir(&statements).unwrap();
    let path = write_statement(
        &statements,
        "a.csv",
        "2023-07-15,NOFRILLS 3421,30.00,,\n2023-07-16,MYSTERY,9.99,,\n2023-07-17,FORTINOS,5.00,,\n",
    );

    let cache = dir.path().join("transaction_types.json");
    let out = dir.path().join("output");
    let sink = FileSink::new(&cache, &out, &OutputNames::default(), run_started()).unwrap();
    let budget_path = sink.budget_json_path().to_path_buf();
    let history_path = sink.history_path().to_path_buf();

    let rules = RuleSet::new(&[RuleSpec::contains("NOFRILLS", "Groceries")]).unwrap();
    let oracle = ScriptedOracle::new(vec![OracleAnswer::Interrupted]);
    let report = StatementRunner::new(scenario_store(), rules, oracle, sink)
        .unwrap()
        .run(&[path])
        .unwrap();

    assert!(report.summary.interrupted);
    assert_eq!(report.summary.rows_accumulated, 1);

    // Rule result learned before the interrupt is saved
    let saved = CategoryStore::load_file(&cache).unwrap();
    assert_eq!(saved.lookup("NOFRILLS 3421"), Some("Groceries"));

    let budget = MonthlyLedger::load(fs::File::open(&budget_path).unwrap()).unwrap();
    assert_eq!(budget.total("Groceries", Month::Jul), Some(30.0));

    let history = fs::read_to_string(&history_path).unwrap();
    assert_eq!(history.lines().count(), 2);
}

#[test]
fn test_rerun_does_not_double_count() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(dir.path(), "a.csv", "2023-07-15,FORTINOS,45.20,,\n");

    let first = StatementRunner::new(
        scenario_store(),
        RuleSet::empty(),
        ScriptedOracle::new(vec![]),
        MemorySink::new(),
    )
    .unwrap()
    .run(&[path.clone()])
    .unwrap();

    let second = StatementRunner::new(
        first.store.clone(),
        RuleSet::empty(),
        ScriptedOracle::new(vec![]),
        MemorySink::new(),
    )
    .unwrap()
    .run(&[path])
    .unwrap();

    assert_eq!(first.ledger, second.ledger);
}

#[test]
fn test_unknown_rule_category_is_fatal() {
    let rules = RuleSet::new(&[RuleSpec::contains("AIR CANADA", "Travel")]).unwrap();
    let mut sink = MemorySink::new();
    let result = StatementRunner::new(
        scenario_store(),
        rules,
        ScriptedOracle::new(vec![]),
        &mut sink,
    )
    .map(|_| ());
    assert!(matches!(result, Err(Error::UnknownCategory(_))));

    // Rejected before the run starts, so nothing is written
    assert_eq!(sink.cache_writes, 0);
    assert_eq!(sink.budget_writes, 0);
    assert_eq!(sink.table_writes, 0);
    assert!(sink.cache.is_none());
}

#[test]
fn test_padded_cache_names_resolve_without_asking() {
    let dir = TempDir::new().unwrap();
    let path = write_statement(
        dir.path(),
        "march.csv",
        "2023-03-01,ACCT BAL REBATE     ,,5.00,\n2023-03-02,MONTHLY ACCOUNT FEE ,4.00,,\n",
    );
    let store = CategoryStore::load(
        r#"{"Ignore": ["ACCT BAL REBATE     ", "MONTHLY ACCOUNT FEE "], "Income": []}"#.as_bytes(),
    )
    .unwrap();

    let mut oracle = ScriptedOracle::new(vec![]);
    let report = StatementRunner::new(store.clone(), RuleSet::empty(), &mut oracle, MemorySink::new())
        .unwrap()
        .run(&[path])
        .unwrap();

    assert_eq!(oracle.asked(), 0);
    assert_eq!(report.summary.learned_matches, 2);
    assert_eq!(report.summary.names_learned, 0);
    assert_eq!(report.store, store);
    assert_eq!(report.ledger.total("Ignore", Month::Mar), Some(-1.0));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_full_run_round_trips_through_files() {
    let dir = TempDir::new().unwrap();
    let statements = dir.path().join("statements");
    fs::create_dir(&statements).unwrap();
    write_statement(
        &statements,
        "july.csv",
        "07/15/2023,FORTINOS,$45.20,,\"1,000.00\"\n07/20/2023,PAYROLL DEPOSIT,,\"2,500.00\",\n",
    );

    let cache = dir.path().join("transaction_types.json");
    fs::write(
        &cache,
        r#"{"Groceries": ["FORTINOS"], "Income": ["PAYROLL DEPOSIT"]}"#,
    )
    .unwrap();

    let store = CategoryStore::load_file(&cache).unwrap();
    let sink = FileSink::new(
        &cache,
        &dir.path().join("output"),
        &OutputNames::default(),
        run_started(),
    )
    .unwrap();
    let table_path = sink.budget_table_path().to_path_buf();

    let report = StatementRunner::new(store, RuleSet::empty(), ScriptedOracle::new(vec![]), sink)
        .unwrap()
        .run_dir(&statements)
        .unwrap();

    // Unknown bucket added at load time and written back
    let saved = CategoryStore::load_file(&cache).unwrap();
    assert_eq!(saved, report.store);
    assert!(saved.contains_category("Unknown"));

    let table = fs::read_to_string(&table_path).unwrap();
    assert!(table.contains("Groceries,,,,,,,45.20,,,,,"));
    assert!(table.contains("Income,,,,,,,2500.00,,,,,"));
    assert!(table.contains("Unknown,,,,,,,,,,,,"));
}

#[test]
fn test_embedded_config_drives_a_run() {
    let dir = TempDir::new().unwrap();
    let config = Config::embedded(dir.path()).unwrap();
    fs::create_dir(&config.statements_dir).unwrap();
    write_statement(
        &config.statements_dir,
        "a.csv",
        "2023-02-01,AMZN MKTP CA,20.00,,\n2023-02-02,TFR-TO C/C 1234,500.00,,\n",
    );
    fs::write(
        &config.category_cache,
        r#"{"Adam RRSP": [], "Groceries": [], "House Purchases": [], "Ignore": [], "Raj Joint": []}"#,
    )
    .unwrap();

    let store = config.open_store().unwrap();
    let sink = FileSink::new(
        &config.category_cache,
        &config.output_dir,
        &config.output_names,
        run_started(),
    )
    .unwrap();

    let report = StatementRunner::new(
        store,
        config.rule_set().unwrap(),
        ScriptedOracle::new(vec![]),
        sink,
    )
    .unwrap()
    .run_dir(&config.statements_dir)
    .unwrap();

    assert_eq!(report.ledger.total("House Purchases", Month::Feb), Some(20.0));
    assert_eq!(report.ledger.total("Ignore", Month::Feb), Some(500.0));
    assert_eq!(report.summary.rule_matches, 2);
    assert!(config.output_dir.join("budget_2024-01-15_09-30-00.json").exists());
}
