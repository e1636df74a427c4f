//! The refresh pipeline.
//!
//! One run walks these stages in order:
//!
//! `FetchCountries -> FetchRates -> ProcessEach -> ReadAggregates -> RenderSummary -> Done`
//!
//! A failure in either fetch stage aborts before anything is written. Row
//! failures during processing are collected into the [`BatchReport`] and the
//! run continues. Failures while reading aggregates or rendering are
//! returned to the caller; rows written earlier stay committed.

use crate::config::{RefreshConfig, SUMMARY_TOP_N};
use crate::connection::Connection;
use crate::error::Result;
use crate::estimator::estimate_gdp_with;
use crate::models::{
    CountryRecord, ExchangeRateTable, NormalizedCountryRecord, RawCountryRecord, RefreshReport,
    SummaryArtifact,
};
use crate::queries::CountryQuery;
use crate::sources::{CountrySource, RateSource};
use crate::summary;
use crate::upsert::{PendingRow, UpsertEngine};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use tracing::{info, warn};

/// Stages of a refresh run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    FetchCountries,
    FetchRates,
    ProcessEach,
    ReadAggregates,
    RenderSummary,
    Done,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::FetchCountries => "fetch_countries",
            RefreshStage::FetchRates => "fetch_rates",
            RefreshStage::ProcessEach => "process_each",
            RefreshStage::ReadAggregates => "read_aggregates",
            RefreshStage::RenderSummary => "render_summary",
            RefreshStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Sequences sources, normalization, estimation, upserts and rendering.
pub struct RefreshPipeline<'a> {
    conn: &'a Connection,
    countries: &'a dyn CountrySource,
    rates: &'a dyn RateSource,
    config: &'a RefreshConfig,
}

impl<'a> RefreshPipeline<'a> {
    pub fn new(
        conn: &'a Connection,
        countries: &'a dyn CountrySource,
        rates: &'a dyn RateSource,
        config: &'a RefreshConfig,
    ) -> Self {
        Self {
            conn,
            countries,
            rates,
            config,
        }
    }

    /// Run once with the thread-local RNG.
    pub fn run(&self) -> Result<RefreshReport> {
        self.run_with(&mut rand::thread_rng())
    }

    /// Run once, drawing GDP scalars from `rng`.
    pub fn run_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RefreshReport> {
        let started = Utc::now();
        info!(stage = %RefreshStage::FetchCountries, "refresh started");
        let raw = self.countries.fetch_countries().inspect_err(|e| {
            warn!(stage = %RefreshStage::FetchCountries, error = %e, "refresh aborted");
        })?;

        info!(stage = %RefreshStage::FetchRates, base = %self.config.base_currency);
        let rates = self
            .rates
            .fetch_rates(&self.config.base_currency)
            .inspect_err(|e| {
                warn!(stage = %RefreshStage::FetchRates, error = %e, "refresh aborted");
            })?;

        info!(stage = %RefreshStage::ProcessEach, records = raw.len());
        let rows = build_rows(&raw, &rates, started, rng);
        let batch = UpsertEngine::new(self.conn).upsert_batch(&rows);
        if !batch.is_clean() {
            warn!(failed = batch.failures.len(), "some records were not stored");
        }

        info!(stage = %RefreshStage::ReadAggregates);
        let query = CountryQuery::new(self.conn);
        let total = query.count()?;
        let top = query.top_by_gdp(SUMMARY_TOP_N)?;

        info!(stage = %RefreshStage::RenderSummary);
        let summary = SummaryArtifact {
            total,
            top,
            generated_at: Utc::now(),
        };
        summary::render_to_path(&summary, &self.config.summary_path)?;

        info!(
            stage = %RefreshStage::Done,
            inserted = batch.inserted,
            updated = batch.updated,
            failed = batch.failures.len(),
            total = summary.total,
            "refresh finished"
        );

        Ok(RefreshReport {
            fetched: raw.len(),
            batch,
            summary,
            summary_path: self.config.summary_path.clone(),
            refreshed_at: started,
        })
    }
}

/// Normalize and estimate every raw record, keeping source order.
///
/// `created_at` is set to the run time; the upsert keeps the stored value
/// for rows that already exist.
pub fn build_rows<R: Rng + ?Sized>(
    raw: &[RawCountryRecord],
    rates: &ExchangeRateTable,
    refreshed_at: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PendingRow> {
    raw.iter()
        .enumerate()
        .map(|(index, raw)| {
            let normalized = NormalizedCountryRecord::from_raw(raw);
            PendingRow {
                index,
                record: to_country_record(normalized, rates, refreshed_at, rng),
            }
        })
        .collect()
}

fn to_country_record<R: Rng + ?Sized>(
    normalized: NormalizedCountryRecord,
    rates: &ExchangeRateTable,
    refreshed_at: DateTime<Utc>,
    rng: &mut R,
) -> Option<CountryRecord> {
    let name = normalized.name?;
    let exchange_rate = normalized
        .currency_code
        .as_deref()
        .and_then(|code| rates.rate(code));
    let estimated_gdp = estimate_gdp_with(
        rng,
        normalized.population,
        normalized.currency_code.as_deref(),
        exchange_rate,
    );

    Some(CountryRecord {
        name,
        capital: normalized.capital,
        region: normalized.region,
        population: normalized.population,
        currency_code: normalized.currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: normalized.flag_url,
        last_refreshed_at: refreshed_at,
        created_at: refreshed_at,
    })
}
