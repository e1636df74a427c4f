//! Country reference data enriched with exchange-rate derived GDP estimates.
//!
//! A refresh pulls the country directory and the exchange-rate table from
//! two HTTP sources, normalizes each country, estimates its GDP, upserts it
//! into a DuckDB table keyed by name and renders a PNG summary.
//!
//! # Quick start
//!
//! ```no_run
//! use country_rates::CountryRates;
//! use country_rates::queries::ListCountriesParams;
//!
//! let rates = CountryRates::builder().build().unwrap();
//!
//! let report = rates.refresh().unwrap();
//! println!("{} countries stored", report.summary.total);
//!
//! let europe = rates
//!     .countries()
//!     .list(&ListCountriesParams {
//!         region: Some("Europe".to_string()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod connection;
pub mod error;
pub mod estimator;
pub mod models;
pub mod normalize;
pub mod queries;
pub mod refresh;
pub mod sources;
pub mod sql_builder;
pub mod summary;
pub mod upsert;

#[cfg(feature = "async")]
pub use async_client::AsyncCountryRates;
pub use config::RefreshConfig;
pub use connection::Connection;
pub use error::{CountryRatesError, FetchFailureKind, Result};
pub use refresh::RefreshPipeline;
pub use sources::{CountrySource, HttpSources, RateSource};
pub use sql_builder::SqlBuilder;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use models::{RefreshReport, StoreStatus};

// ---------------------------------------------------------------------------
// CountryRatesBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CountryRates`] instance.
///
/// Use [`CountryRates::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](CountryRatesBuilder::build).
pub struct CountryRatesBuilder {
    data_dir: Option<PathBuf>,
    in_memory: bool,
    pool_size: usize,
    countries_url: Option<String>,
    rates_url: Option<String>,
    base_currency: Option<String>,
    summary_path: Option<PathBuf>,
    timeout: Duration,
}

impl Default for CountryRatesBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            in_memory: false,
            pool_size: config::DEFAULT_POOL_SIZE,
            countries_url: None,
            rates_url: None,
            base_currency: None,
            summary_path: None,
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl CountryRatesBuilder {
    /// Directory holding the database file and, by default, the summary image.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/country-rates` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the database in memory instead of on disk.
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        self
    }

    /// Number of pooled database connections. Defaults to 4.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn countries_url(mut self, url: impl Into<String>) -> Self {
        self.countries_url = Some(url.into());
        self
    }

    /// Base URL of the rates feed; the base currency is appended as a path segment.
    pub fn rates_url(mut self, url: impl Into<String>) -> Self {
        self.rates_url = Some(url.into());
        self
    }

    /// Currency all rates are expressed against. Defaults to `USD`.
    pub fn base_currency(mut self, code: impl Into<String>) -> Self {
        self.base_currency = Some(code.into());
        self
    }

    /// Where the summary image is written. Defaults to `<data_dir>/summary.png`.
    pub fn summary_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.summary_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// HTTP request timeout for both sources. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the refresh configuration without opening anything.
    pub fn refresh_config(&self) -> RefreshConfig {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(config::default_data_dir);
        let mut cfg = RefreshConfig::with_data_dir(&data_dir);
        if let Some(ref url) = self.countries_url {
            cfg.countries_url = url.clone();
        }
        if let Some(ref url) = self.rates_url {
            cfg.rates_url = url.clone();
        }
        if let Some(ref base) = self.base_currency {
            cfg.base_currency = base.to_uppercase();
        }
        if let Some(ref path) = self.summary_path {
            cfg.summary_path = path.clone();
        }
        cfg.timeout = self.timeout;
        cfg
    }

    /// Open the database, create the schema if needed and build the HTTP client.
    pub fn build(self) -> Result<CountryRates> {
        let config = self.refresh_config();
        let conn = if self.in_memory {
            Connection::open_in_memory(self.pool_size)?
        } else {
            let data_dir = self
                .data_dir
                .clone()
                .unwrap_or_else(config::default_data_dir);
            Connection::open(data_dir.join(config::DB_FILE_NAME), self.pool_size)?
        };
        let sources = HttpSources::from_config(&config)?;
        Ok(CountryRates {
            conn,
            sources,
            config,
            refresh_lock: Mutex::new(()),
        })
    }
}

// ---------------------------------------------------------------------------
// CountryRates
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Owns the connection pool, the HTTP sources and the refresh
/// configuration. Refreshes are serialized by an internal lock; reads run
/// concurrently with them.
pub struct CountryRates {
    conn: Connection,
    sources: HttpSources,
    config: RefreshConfig,
    refresh_lock: Mutex<()>,
}

impl CountryRates {
    /// Create a new builder.
    pub fn builder() -> CountryRatesBuilder {
        CountryRatesBuilder::default()
    }

    /// Access the country query interface.
    pub fn countries(&self) -> queries::CountryQuery<'_> {
        queries::CountryQuery::new(&self.conn)
    }

    /// Total stored countries and the latest refresh time.
    pub fn status(&self) -> Result<StoreStatus> {
        self.countries().status()
    }

    /// Run the refresh pipeline against the configured HTTP sources.
    pub fn refresh(&self) -> Result<RefreshReport> {
        self.refresh_from(&self.sources, &self.sources)
    }

    /// Run the refresh pipeline against arbitrary sources.
    ///
    /// Only one refresh runs at a time; a second caller waits for the first.
    pub fn refresh_from(
        &self,
        countries: &dyn CountrySource,
        rates: &dyn RateSource,
    ) -> Result<RefreshReport> {
        let _guard = self.refresh_lock.lock().map_err(|_| {
            CountryRatesError::Internal("refresh lock poisoned".to_string())
        })?;
        RefreshPipeline::new(&self.conn, countries, rates, &self.config).run()
    }

    /// Path of the summary image (which may not exist yet).
    pub fn summary_path(&self) -> &Path {
        &self.config.summary_path
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl fmt::Display for CountryRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CountryRates(base={}, pool_size={}, summary={})",
            self.config.base_currency,
            self.conn.pool_size(),
            self.config.summary_path.display()
        )
    }
}
