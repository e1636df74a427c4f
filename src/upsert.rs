//! Insert-or-update of country rows keyed by name.
//!
//! Each record is written with a single `INSERT ... ON CONFLICT (name) DO
//! UPDATE` statement. Every mutable column is overwritten; `created_at` is
//! only ever set by the insert branch. Batches are not wrapped in a
//! transaction: rows committed before a failure stay committed.

use crate::connection::Connection;
use crate::error::Result;
use crate::models::{BatchReport, CountryRecord, RowFailure, UpsertOutcome};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::params;
use tracing::{debug, warn};

const UPSERT_SQL: &str = r#"
    INSERT INTO countries (
        name, capital, region, population, currency_code,
        exchange_rate, estimated_gdp, flag_url, last_refreshed_at, created_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (name) DO UPDATE SET
        capital = excluded.capital,
        region = excluded.region,
        population = excluded.population,
        currency_code = excluded.currency_code,
        exchange_rate = excluded.exchange_rate,
        estimated_gdp = excluded.estimated_gdp,
        flag_url = excluded.flag_url,
        last_refreshed_at = excluded.last_refreshed_at
"#;

/// Format a timestamp the way it is stored: RFC 3339, milliseconds, `Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A record waiting to be written, plus its position in the source listing.
#[derive(Debug, Clone)]
pub struct PendingRow {
    pub index: usize,
    /// `None` when the source record had no usable name.
    pub record: Option<CountryRecord>,
}

/// Writes country rows through the shared connection pool.
pub struct UpsertEngine<'a> {
    conn: &'a Connection,
}

impl<'a> UpsertEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert the record, or update the existing row with the same name.
    pub fn upsert(&self, record: &CountryRecord) -> Result<UpsertOutcome> {
        let conn = self.conn.acquire()?;

        let exists = {
            let mut stmt = conn.prepare("SELECT 1 FROM countries WHERE name = ?")?;
            let mut rows = stmt.query(params![record.name])?;
            let found = rows.next()?.is_some();
            found
        };

        conn.execute(
            UPSERT_SQL,
            params![
                record.name,
                record.capital,
                record.region,
                record.population,
                record.currency_code,
                record.exchange_rate,
                record.estimated_gdp,
                record.flag_url,
                format_timestamp(&record.last_refreshed_at),
                format_timestamp(&record.created_at),
            ],
        )?;

        let outcome = if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        debug!(name = %record.name, ?outcome, "upserted country");
        Ok(outcome)
    }

    /// Upsert rows one by one in order, collecting a per-row outcome.
    ///
    /// A failing row is recorded and processing continues with the next one.
    pub fn upsert_batch(&self, rows: &[PendingRow]) -> BatchReport {
        let mut report = BatchReport::default();

        for row in rows {
            let Some(record) = &row.record else {
                report.failures.push(RowFailure {
                    index: row.index,
                    name: None,
                    error: "record has no name".to_string(),
                });
                continue;
            };

            match self.upsert(record) {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(name = %record.name, error = %e, "upsert failed");
                    report.failures.push(RowFailure {
                        index: row.index,
                        name: Some(record.name.clone()),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
