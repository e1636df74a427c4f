use std::path::PathBuf;
use std::time::Duration;

pub const COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const RATES_URL: &str = "https://open.er-api.com/v6/latest";
pub const BASE_CURRENCY: &str = "USD";

pub const DB_FILE_NAME: &str = "countries.duckdb";
pub const SUMMARY_FILE_NAME: &str = "summary.png";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Fields every raw directory record is padded to before projection.
pub const RAW_COUNTRY_FIELDS: &[&str] = &[
    "name",
    "capital",
    "region",
    "population",
    "currencies",
    "flag",
];

/// The fixed field set of a normalized country record.
pub const NORMALIZED_COUNTRY_FIELDS: &[&str] = &[
    "name",
    "capital",
    "region",
    "population",
    "currency_code",
    "flag_url",
];

/// Inclusive bounds of the random scalar used by the GDP estimator.
pub const GDP_SCALAR_MIN: u32 = 1000;
pub const GDP_SCALAR_MAX: u32 = 2000;

pub const SUMMARY_TOP_N: usize = 5;

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("country-rates")
    } else {
        PathBuf::from(".country-rates")
    }
}

/// Everything a refresh run needs to know about the outside world.
///
/// Built by [`CountryRatesBuilder`](crate::CountryRatesBuilder); nothing in
/// the pipeline reads URLs or paths from globals.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub countries_url: String,
    pub rates_url: String,
    pub base_currency: String,
    pub summary_path: PathBuf,
    pub timeout: Duration,
}

impl RefreshConfig {
    /// Defaults rooted at the given data directory.
    pub fn with_data_dir(data_dir: &std::path::Path) -> Self {
        Self {
            countries_url: COUNTRIES_URL.to_string(),
            rates_url: RATES_URL.to_string(),
            base_currency: BASE_CURRENCY.to_string(),
            summary_path: data_dir.join(SUMMARY_FILE_NAME),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
