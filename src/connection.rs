//! DuckDB store: a small bounded pool of connections plus query helpers.
//!
//! All connections are clones of one database handle, so they share the
//! same data (including an in-memory database). A connection is held only
//! for the duration of one query or command.

use crate::error::{CountryRatesError, Result};
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::ops::Deref;
use std::path::Path;
use std::sync::{Condvar, Mutex};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    name              VARCHAR PRIMARY KEY,
    capital           VARCHAR,
    region            VARCHAR,
    population        BIGINT,
    currency_code     VARCHAR,
    exchange_rate     DOUBLE,
    estimated_gdp     DOUBLE,
    flag_url          VARCHAR,
    last_refreshed_at VARCHAR NOT NULL,
    created_at        VARCHAR NOT NULL
);
"#;

/// Bounded pool of DuckDB connections to a single database.
pub struct Connection {
    idle: Mutex<Vec<DuckDbConnection>>,
    available: Condvar,
    size: usize,
}

/// A connection checked out of the pool; returned on drop.
pub struct PooledConnection<'a> {
    pool: &'a Connection,
    conn: Option<DuckDbConnection>,
}

impl Deref for PooledConnection<'_> {
    type Target = DuckDbConnection;

    fn deref(&self) -> &DuckDbConnection {
        // Only `None` after drop has started.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Ok(mut idle) = self.pool.idle.lock() {
                idle.push(conn);
                self.pool.available.notify_one();
            }
        }
    }
}

impl Connection {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let primary = DuckDbConnection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), pool_size, "opened database");
        Self::from_primary(primary, pool_size)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(pool_size: usize) -> Result<Self> {
        let primary = DuckDbConnection::open_in_memory()?;
        Self::from_primary(primary, pool_size)
    }

    fn from_primary(primary: DuckDbConnection, pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(CountryRatesError::InvalidArgument(
                "pool size must be at least 1".to_string(),
            ));
        }
        primary.execute_batch(SCHEMA)?;

        let mut idle = Vec::with_capacity(pool_size);
        for _ in 1..pool_size {
            idle.push(primary.try_clone()?);
        }
        idle.push(primary);

        Ok(Self {
            idle: Mutex::new(idle),
            available: Condvar::new(),
            size: pool_size,
        })
    }

    /// Maximum number of simultaneously checked-out connections.
    pub fn pool_size(&self) -> usize {
        self.size
    }

    /// Check a connection out, blocking until one is idle.
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let mut idle = self.idle.lock().map_err(|_| pool_poisoned())?;
        loop {
            if let Some(conn) = idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }
            idle = self.available.wait(idle).map_err(|_| pool_poisoned())?;
        }
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let stmt_ref = rows_result.as_ref().ok_or_else(|| {
            CountryRatesError::InvalidArgument("statement produced no result set".to_string())
        })?;
        let column_names: Vec<String> = stmt_ref
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Run a data-modifying statement and return the number of affected rows.
    pub fn execute_command(&self, sql: &str, params: &[String]) -> Result<usize> {
        let conn = self.acquire()?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();
        Ok(conn.execute(sql, param_values.as_slice())?)
    }
}

fn pool_poisoned() -> CountryRatesError {
    CountryRatesError::Internal("connection pool lock poisoned".to_string())
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        // Nothing in the schema uses the remaining types.
        _ => serde_json::Value::Null,
    }
}
