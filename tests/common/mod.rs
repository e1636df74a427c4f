//! Shared fixtures for the integration tests.
//!
//! Provides an in-memory store, sample country rows and in-memory fakes of
//! the two external sources.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use country_rates::error::FetchFailureKind;
use country_rates::models::{CountryRecord, ExchangeRateTable, RawCountryRecord};
use country_rates::upsert::UpsertEngine;
use country_rates::{CountryRates, CountryRatesError, CountrySource, RateSource, Result};
use serde_json::Value;
use std::cell::Cell;

/// An in-memory `CountryRates` whose summary image goes into a temp dir.
///
/// The caller must keep the `TempDir` alive for the duration of the test.
pub fn setup_rates() -> (CountryRates, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let rates = CountryRates::builder()
        .in_memory(true)
        .pool_size(2)
        .data_dir(tmp_dir.path())
        .build()
        .unwrap();
    (rates, tmp_dir)
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn record(name: &str, region: &str, currency: Option<&str>, gdp: Option<f64>) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        capital: Some(format!("{name} City")),
        region: Some(region.to_string()),
        population: Some(1_000_000),
        currency_code: currency.map(str::to_string),
        exchange_rate: currency.map(|_| 2.0),
        estimated_gdp: gdp,
        flag_url: Some(format!("https://flags.example/{}.svg", name.to_lowercase())),
        last_refreshed_at: ts(0),
        created_at: ts(0),
    }
}

/// Five countries over two regions, one of them without a GDP estimate.
pub fn seed_sample_rows(rates: &CountryRates) {
    let engine = UpsertEngine::new(rates.connection());
    for r in [
        record("France", "Europe", Some("EUR"), Some(3_000.0)),
        record("Germany", "Europe", Some("EUR"), Some(4_000.0)),
        record("Japan", "Asia", Some("JPY"), Some(5_000.0)),
        record("Nepal", "Asia", Some("NPR"), None),
        record("Antarctica", "Polar", None, Some(0.0)),
    ] {
        engine.upsert(&r).unwrap();
    }
}

pub fn raw(value: Value) -> RawCountryRecord {
    match value {
        Value::Object(map) => RawCountryRecord(map),
        other => panic!("fixture is not an object: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Fake sources
// ---------------------------------------------------------------------------

pub struct FakeCountries {
    pub records: Vec<RawCountryRecord>,
    pub fail: bool,
    pub calls: Cell<usize>,
}

impl FakeCountries {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: records.into_iter().map(raw).collect(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
            calls: Cell::new(0),
        }
    }
}

impl CountrySource for FakeCountries {
    fn fetch_countries(&self) -> Result<Vec<RawCountryRecord>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(CountryRatesError::UpstreamFetch {
                origin: "country directory".to_string(),
                kind: FetchFailureKind::HttpStatus,
                message: "status 503 Service Unavailable".to_string(),
            });
        }
        Ok(self.records.clone())
    }
}

pub struct FakeRates {
    pub table: ExchangeRateTable,
    pub fail: bool,
    pub calls: Cell<usize>,
}

impl FakeRates {
    pub fn new(rates: &[(&str, f64)]) -> Self {
        let mut table = ExchangeRateTable::new("USD");
        for (code, rate) in rates {
            table.insert(code, *rate);
        }
        Self {
            table,
            fail: false,
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            table: ExchangeRateTable::new("USD"),
            fail: true,
            calls: Cell::new(0),
        }
    }
}

impl RateSource for FakeRates {
    fn fetch_rates(&self, _base: &str) -> Result<ExchangeRateTable> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(CountryRatesError::UpstreamParse {
                origin: "exchange rates".to_string(),
                message: "missing `rates` object".to_string(),
            });
        }
        Ok(self.table.clone())
    }
}
