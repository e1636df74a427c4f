use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use country_rates::CountryRatesError;
use serde_json::{json, Value};

/// Unified error type that renders as `{"error": "...", "details": ...}`
/// with an appropriate HTTP status code.
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
            details: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>, details: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            details: Some(details),
        }
    }

    pub fn service_unavailable(msg: impl Into<String>, details: Value) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.into(),
            details: Some(details),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            details: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CountryRatesError> for AppError {
    fn from(e: CountryRatesError) -> Self {
        match &e {
            CountryRatesError::NotFound(_) => AppError::not_found("Country not found"),
            CountryRatesError::InvalidArgument(msg) => {
                AppError::bad_request("Validation failed", json!(msg))
            }
            _ if e.is_upstream() => AppError::service_unavailable(
                "External data source unavailable",
                json!(format!(
                    "Could not fetch data from {}",
                    e.upstream_origin().unwrap_or("upstream")
                )),
            ),
            _ => {
                tracing::error!(error = %e, "request failed");
                AppError::internal("Internal server error")
            }
        }
    }
}
