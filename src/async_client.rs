//! Async wrapper around [`CountryRates`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the event loop free while
//! DuckDB queries and source downloads run.
//!
//! # Example
//!
//! ```ignore
//! use country_rates::AsyncCountryRates;
//!
//! #[tokio::main]
//! async fn main() {
//!     let rates = AsyncCountryRates::builder().build().await.unwrap();
//!     let report = rates.refresh().await.unwrap();
//!     let status = rates.status().await.unwrap();
//!     assert_eq!(status.total_countries, report.summary.total);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CountryRatesError, Result};
use crate::models::{RefreshReport, StoreStatus};
use crate::CountryRates;

// ---------------------------------------------------------------------------
// AsyncCountryRatesBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncCountryRates`]; mirrors
/// [`CountryRatesBuilder`](crate::CountryRatesBuilder).
#[derive(Default)]
pub struct AsyncCountryRatesBuilder {
    inner: crate::CountryRatesBuilder,
}

impl AsyncCountryRatesBuilder {
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.data_dir(path);
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.inner = self.inner.in_memory(in_memory);
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.inner = self.inner.pool_size(size);
        self
    }

    pub fn countries_url(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.countries_url(url);
        self
    }

    pub fn rates_url(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.rates_url(url);
        self
    }

    pub fn base_currency(mut self, code: impl Into<String>) -> Self {
        self.inner = self.inner.base_currency(code);
        self
    }

    pub fn summary_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.summary_path(path);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Build on the blocking thread pool (opens the database file and
    /// constructs the blocking HTTP client).
    pub async fn build(self) -> Result<AsyncCountryRates> {
        let inner = self.inner;
        tokio::task::spawn_blocking(move || {
            Ok(AsyncCountryRates {
                inner: Arc::new(inner.build()?),
            })
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncCountryRates
// ---------------------------------------------------------------------------

/// Async wrapper around [`CountryRates`].
///
/// `CountryRates` is `Sync` (pooled connections, internal refresh lock), so
/// it is shared through an `Arc` without an outer mutex: reads keep running
/// while a refresh is in progress.
#[derive(Clone)]
pub struct AsyncCountryRates {
    inner: Arc<CountryRates>,
}

impl AsyncCountryRates {
    pub fn builder() -> AsyncCountryRatesBuilder {
        AsyncCountryRatesBuilder::default()
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// ```no_run
    /// # use country_rates::AsyncCountryRates;
    /// # async fn example() -> country_rates::Result<()> {
    /// # let rates = AsyncCountryRates::builder().build().await?;
    /// let france = rates.run(|r| r.countries().get("France")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CountryRates) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(inner.as_ref()))
            .await
            .map_err(join_error)?
    }

    pub async fn refresh(&self) -> Result<RefreshReport> {
        self.run(|r| r.refresh()).await
    }

    pub async fn status(&self) -> Result<StoreStatus> {
        self.run(|r| r.status()).await
    }

    pub fn summary_path(&self) -> PathBuf {
        self.inner.summary_path().to_path_buf()
    }
}

fn join_error(e: tokio::task::JoinError) -> CountryRatesError {
    CountryRatesError::Internal(format!("Task join error: {e}"))
}
