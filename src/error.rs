use std::fmt;

/// How a call to an external source failed before yielding a usable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    /// Transport-level failure (DNS, connect, timeout, body read).
    Fetch,
    /// The source answered with a non-2xx status.
    HttpStatus,
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailureKind::Fetch => f.write_str("fetch"),
            FetchFailureKind::HttpStatus => f.write_str("http status"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CountryRatesError {
    #[error("Could not fetch data from {origin} ({kind}): {message}")]
    UpstreamFetch {
        origin: String,
        kind: FetchFailureKind,
        message: String,
    },

    #[error("Could not parse data from {origin}: {message}")]
    UpstreamParse { origin: String, message: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] duckdb::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A fault inside this process (poisoned lock, failed worker task).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CountryRatesError {
    /// True for failures of either external source (fetch or parse).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CountryRatesError::UpstreamFetch { .. } | CountryRatesError::UpstreamParse { .. }
        )
    }

    /// Name of the external source that failed, if this is an upstream error.
    pub fn upstream_origin(&self) -> Option<&str> {
        match self {
            CountryRatesError::UpstreamFetch { origin, .. }
            | CountryRatesError::UpstreamParse { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CountryRatesError>;
