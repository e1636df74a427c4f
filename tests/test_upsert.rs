//! Upsert engine tests against an in-memory store.

mod common;

use country_rates::models::UpsertOutcome;
use country_rates::upsert::{PendingRow, UpsertEngine};

#[test]
fn first_write_inserts_second_updates() {
    let (rates, _tmp) = common::setup_rates();
    let engine = UpsertEngine::new(rates.connection());

    let rec = common::record("France", "Europe", Some("EUR"), Some(10.0));
    assert_eq!(engine.upsert(&rec).unwrap(), UpsertOutcome::Inserted);
    assert_eq!(engine.upsert(&rec).unwrap(), UpsertOutcome::Updated);

    assert_eq!(rates.countries().count().unwrap(), 1);
}

#[test]
fn update_overwrites_mutable_fields_and_keeps_created_at() {
    let (rates, _tmp) = common::setup_rates();
    let engine = UpsertEngine::new(rates.connection());

    let first = common::record("France", "Europe", Some("EUR"), Some(10.0));
    engine.upsert(&first).unwrap();

    let mut second = common::record("France", "Western Europe", None, Some(0.0));
    second.capital = None;
    second.population = Some(68_000_000);
    second.exchange_rate = None;
    second.flag_url = None;
    second.last_refreshed_at = common::ts(3600);
    second.created_at = common::ts(3600);
    engine.upsert(&second).unwrap();

    let stored = rates.countries().get("France").unwrap().unwrap();
    assert_eq!(stored.region.as_deref(), Some("Western Europe"));
    assert_eq!(stored.capital, None);
    assert_eq!(stored.population, Some(68_000_000));
    assert_eq!(stored.currency_code, None);
    assert_eq!(stored.exchange_rate, None);
    assert_eq!(stored.estimated_gdp, Some(0.0));
    assert_eq!(stored.flag_url, None);
    assert_eq!(stored.last_refreshed_at, common::ts(3600));
    assert_eq!(stored.created_at, common::ts(0));
}

#[test]
fn batch_reports_each_row_and_continues_past_failures() {
    let (rates, _tmp) = common::setup_rates();
    let engine = UpsertEngine::new(rates.connection());
    engine
        .upsert(&common::record("Chile", "Americas", Some("CLP"), None))
        .unwrap();

    let rows = vec![
        PendingRow {
            index: 0,
            record: Some(common::record("Chile", "Americas", Some("CLP"), Some(5.0))),
        },
        PendingRow {
            index: 1,
            record: None,
        },
        PendingRow {
            index: 2,
            record: Some(common::record("Peru", "Americas", Some("PEN"), Some(7.0))),
        },
    ];

    let report = engine.upsert_batch(&rows);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].name, None);
    assert!(!report.is_clean());

    assert_eq!(rates.countries().count().unwrap(), 2);
}

#[test]
fn same_name_twice_in_one_batch_leaves_one_row() {
    let (rates, _tmp) = common::setup_rates();
    let engine = UpsertEngine::new(rates.connection());

    let rows: Vec<PendingRow> = (0..2)
        .map(|index| PendingRow {
            index,
            record: Some(common::record("France", "Europe", Some("EUR"), Some(index as f64))),
        })
        .collect();

    let report = engine.upsert_batch(&rows);
    assert_eq!((report.inserted, report.updated), (1, 1));

    let rows = rates
        .connection()
        .execute("SELECT * FROM countries WHERE name = ?", &["France".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    // Last write wins within a run.
    assert_eq!(rows[0]["estimated_gdp"], 1.0);
}
