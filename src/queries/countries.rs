//! Country lookups, listings and store aggregates.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::connection::Connection;
use crate::error::{CountryRatesError, Result};
use crate::models::{CountryRecord, RankedCountry, StoreStatus};
use crate::sql_builder::SqlBuilder;

const COLUMNS: &[&str] = &[
    "name",
    "capital",
    "region",
    "population",
    "currency_code",
    "exchange_rate",
    "estimated_gdp",
    "flag_url",
    "last_refreshed_at",
    "created_at",
];

// ---------------------------------------------------------------------------
// CountrySort
// ---------------------------------------------------------------------------

/// Orderings accepted by [`CountryQuery::list`].
///
/// GDP orderings always put rows without an estimate last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountrySort {
    GdpDesc,
    GdpAsc,
    PopulationDesc,
    PopulationAsc,
    NameAsc,
    NameDesc,
}

impl CountrySort {
    fn order_by(self) -> &'static [&'static str] {
        match self {
            CountrySort::GdpDesc => &["estimated_gdp DESC NULLS LAST", "name ASC"],
            CountrySort::GdpAsc => &["estimated_gdp ASC NULLS LAST", "name ASC"],
            CountrySort::PopulationDesc => &["population DESC NULLS LAST", "name ASC"],
            CountrySort::PopulationAsc => &["population ASC NULLS LAST", "name ASC"],
            CountrySort::NameAsc => &["name ASC"],
            CountrySort::NameDesc => &["name DESC"],
        }
    }
}

impl FromStr for CountrySort {
    type Err = CountryRatesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gdp_desc" => Ok(CountrySort::GdpDesc),
            "gdp_asc" => Ok(CountrySort::GdpAsc),
            "population_desc" => Ok(CountrySort::PopulationDesc),
            "population_asc" => Ok(CountrySort::PopulationAsc),
            "name_asc" | "name" => Ok(CountrySort::NameAsc),
            "name_desc" => Ok(CountrySort::NameDesc),
            other => Err(CountryRatesError::InvalidArgument(format!(
                "unknown sort '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ListCountriesParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ListCountriesParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<CountrySort>,
}

// ---------------------------------------------------------------------------
// CountryQuery
// ---------------------------------------------------------------------------

pub struct CountryQuery<'a> {
    conn: &'a Connection,
}

impl<'a> CountryQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List countries, optionally filtered by region and currency code
    /// (both case-insensitive). Defaults to name order.
    pub fn list(&self, params: &ListCountriesParams) -> Result<Vec<CountryRecord>> {
        let mut qb = SqlBuilder::new("countries");
        qb.select(COLUMNS);

        if let Some(ref region) = params.region {
            qb.where_eq_ignore_case("region", region);
        }
        if let Some(ref currency) = params.currency {
            qb.where_eq_ignore_case("currency_code", currency);
        }
        qb.order_by(params.sort.unwrap_or(CountrySort::NameAsc).order_by());

        let (sql, sql_params) = qb.build();
        self.conn.execute_into(&sql, &sql_params)
    }

    /// Get one country by name: the exact key if stored, otherwise the
    /// first case-insensitive match in name order.
    pub fn get(&self, name: &str) -> Result<Option<CountryRecord>> {
        let (sql, params) = SqlBuilder::new("countries")
            .select(COLUMNS)
            .where_eq("name", name)
            .limit(1)
            .build();
        let exact: Vec<CountryRecord> = self.conn.execute_into(&sql, &params)?;
        if let Some(found) = exact.into_iter().next() {
            return Ok(Some(found));
        }

        // No row stored under this exact key; fall back to any spelling.
        let (sql, params) = SqlBuilder::new("countries")
            .select(COLUMNS)
            .where_eq_ignore_case("name", name)
            .order_by(&["name ASC"])
            .limit(1)
            .build();
        let rows: Vec<CountryRecord> = self.conn.execute_into(&sql, &params)?;
        Ok(rows.into_iter().next())
    }

    /// Delete the one country that [`get`](Self::get) resolves `name` to.
    pub fn delete(&self, name: &str) -> Result<()> {
        let resolved = self
            .get(name)?
            .ok_or_else(|| CountryRatesError::NotFound(format!("country '{name}'")))?;
        let deleted = self.conn.execute_command(
            "DELETE FROM countries WHERE name = ?",
            &[resolved.name.clone()],
        )?;
        if deleted == 0 {
            return Err(CountryRatesError::NotFound(format!("country '{name}'")));
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let value = self
            .conn
            .execute_scalar("SELECT COUNT(*) FROM countries", &[])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// The `n` countries with the highest estimate, rows without one last.
    pub fn top_by_gdp(&self, n: usize) -> Result<Vec<RankedCountry>> {
        let (sql, params) = SqlBuilder::new("countries")
            .select(&["name", "estimated_gdp"])
            .order_by(CountrySort::GdpDesc.order_by())
            .limit(n)
            .build();
        self.conn.execute_into(&sql, &params)
    }

    /// Row count and the most recent refresh timestamp in the store.
    pub fn status(&self) -> Result<StoreStatus> {
        let rows = self.conn.execute(
            "SELECT COUNT(*) AS total, MAX(last_refreshed_at) AS last_refreshed_at FROM countries",
            &[],
        )?;
        let row = rows.into_iter().next();

        let total_countries = row
            .as_ref()
            .and_then(|r| r.get("total"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let last_refreshed_at = row
            .as_ref()
            .and_then(|r| r.get("last_refreshed_at"))
            .and_then(|v| v.as_str())
            .map(parse_timestamp)
            .transpose()?;

        Ok(StoreStatus {
            total_countries,
            last_refreshed_at,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CountryRatesError::InvalidArgument(format!("bad timestamp '{s}': {e}")))
}
