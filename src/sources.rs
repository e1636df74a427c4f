//! Adapters for the two external sources: the country directory and the
//! exchange-rate feed.
//!
//! Each call is a single blocking HTTP request with no retry. Transport and
//! status failures become [`CountryRatesError::UpstreamFetch`]; bodies that
//! do not decode into the expected shape become
//! [`CountryRatesError::UpstreamParse`].

use crate::config::RefreshConfig;
use crate::error::{CountryRatesError, FetchFailureKind, Result};
use crate::models::{ExchangeRateTable, RawCountryRecord};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const COUNTRIES_ORIGIN: &str = "country directory";
pub const RATES_ORIGIN: &str = "exchange rates";

/// Anything that can list raw country records.
pub trait CountrySource {
    fn fetch_countries(&self) -> Result<Vec<RawCountryRecord>>;
}

/// Anything that can produce an exchange-rate table for a base currency.
pub trait RateSource {
    fn fetch_rates(&self, base: &str) -> Result<ExchangeRateTable>;
}

/// HTTP implementation of both sources over one blocking client.
pub struct HttpSources {
    countries_url: String,
    rates_url: String,
    client: Client,
}

impl HttpSources {
    pub fn new(countries_url: &str, rates_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| CountryRatesError::InvalidArgument(format!("HTTP client: {e}")))?;
        Ok(Self {
            countries_url: countries_url.to_string(),
            rates_url: rates_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &RefreshConfig) -> Result<Self> {
        Self::new(&config.countries_url, &config.rates_url, config.timeout)
    }

    /// GET `url` and decode the body as JSON, classifying every failure.
    fn get_json(&self, origin: &str, url: &str) -> Result<Value> {
        debug!(origin, url, "requesting");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(origin, FetchFailureKind::Fetch, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(origin, %status, "upstream returned non-success status");
            return Err(fetch_error(
                origin,
                FetchFailureKind::HttpStatus,
                format!("status {status}"),
            ));
        }

        let body = resp
            .bytes()
            .map_err(|e| fetch_error(origin, FetchFailureKind::Fetch, e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| parse_error(origin, e.to_string()))
    }
}

impl CountrySource for HttpSources {
    fn fetch_countries(&self) -> Result<Vec<RawCountryRecord>> {
        let body = self.get_json(COUNTRIES_ORIGIN, &self.countries_url)?;
        let countries = parse_countries(body)?;
        info!(count = countries.len(), "fetched country directory");
        Ok(countries)
    }
}

impl RateSource for HttpSources {
    fn fetch_rates(&self, base: &str) -> Result<ExchangeRateTable> {
        let url = format!("{}/{}", self.rates_url, base.to_uppercase());
        let body = self.get_json(RATES_ORIGIN, &url)?;
        let table = parse_rates(body, base)?;
        info!(base = %table.base, count = table.len(), "fetched exchange rates");
        Ok(table)
    }
}

/// Decode a directory payload: a JSON array whose items are objects.
pub fn parse_countries(body: Value) -> Result<Vec<RawCountryRecord>> {
    let Value::Array(items) = body else {
        return Err(parse_error(COUNTRIES_ORIGIN, "expected a JSON array".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(RawCountryRecord(map)),
            other => Err(parse_error(
                COUNTRIES_ORIGIN,
                format!("item {i} is not an object: {other}"),
            )),
        })
        .collect()
}

/// Decode a rates payload: `{"base_code": "USD", "rates": {"EUR": 0.92, ...}}`.
///
/// Entries that are not positive numbers are skipped.
pub fn parse_rates(body: Value, requested_base: &str) -> Result<ExchangeRateTable> {
    let rates = body
        .get("rates")
        .and_then(|r| r.as_object())
        .ok_or_else(|| parse_error(RATES_ORIGIN, "missing `rates` object".to_string()))?;

    let base = body
        .get("base_code")
        .or_else(|| body.get("base"))
        .and_then(|b| b.as_str())
        .unwrap_or(requested_base);

    let mut table = ExchangeRateTable::new(base);
    let mut skipped = 0usize;
    for (code, value) in rates {
        let stored = value.as_f64().map(|r| table.insert(code, r)).unwrap_or(false);
        if !stored {
            skipped += 1;
        }
    }
    if skipped > 0 {
        debug!(skipped, "ignored unusable exchange rates");
    }
    Ok(table)
}

fn fetch_error(origin: &str, kind: FetchFailureKind, message: String) -> CountryRatesError {
    CountryRatesError::UpstreamFetch {
        origin: origin.to_string(),
        kind,
        message,
    }
}

fn parse_error(origin: &str, message: String) -> CountryRatesError {
    CountryRatesError::UpstreamParse {
        origin: origin.to_string(),
        message,
    }
}
