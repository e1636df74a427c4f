use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /status
///
/// Returns the number of stored countries and the latest refresh time.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let status = state.rates.status().await?;

    Ok(Json(json!({
        "total_countries": status.total_countries,
        "last_refreshed_at": status.last_refreshed_at,
    })))
}
