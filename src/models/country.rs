use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// RawCountryRecord — one entry of the country directory, untrusted
// ---------------------------------------------------------------------------

/// A country as received from the directory source.
///
/// Kept as a loose JSON object: any field may be missing or carry an
/// unexpected type. The normalizer is responsible for turning it into a
/// [`NormalizedCountryRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCountryRecord(pub serde_json::Map<String, serde_json::Value>);

impl RawCountryRecord {
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawCountryRecord {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// ExchangeRateTable
// ---------------------------------------------------------------------------

/// Units of each currency per one unit of `base`.
///
/// Only strictly positive rates are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    pub base: String,
    rates: HashMap<String, f64>,
}

impl ExchangeRateTable {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            rates: HashMap::new(),
        }
    }

    /// Insert a rate, ignoring non-finite or non-positive values.
    ///
    /// Returns `true` if the rate was stored.
    pub fn insert(&mut self, code: &str, rate: f64) -> bool {
        if !rate.is_finite() || rate <= 0.0 {
            return false;
        }
        self.rates.insert(code.to_uppercase(), rate);
        true
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NormalizedCountryRecord
// ---------------------------------------------------------------------------

/// A directory record reduced to the fixed field set.
///
/// Every field serializes, `null` included, so consumers never see a
/// missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCountryRecord {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub flag_url: Option<String>,
}

// ---------------------------------------------------------------------------
// CountryRecord — the persisted row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Summary and run reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCountry {
    pub name: String,
    pub estimated_gdp: Option<f64>,
}

/// Data shown on the rendered summary image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub total: i64,
    pub top: Vec<RankedCountry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStatus {
    pub total_countries: i64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Position of the record in the source listing.
    pub index: usize,
    pub name: Option<String>,
    pub error: String,
}

/// Per-record outcomes of one batch of upserts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a completed refresh run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub fetched: usize,
    pub batch: BatchReport,
    pub summary: SummaryArtifact,
    pub summary_path: PathBuf,
    pub refreshed_at: DateTime<Utc>,
}
