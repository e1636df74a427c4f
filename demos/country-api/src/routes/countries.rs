use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use country_rates::queries::{CountrySort, ListCountriesParams};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

/// POST /countries/refresh
///
/// Run the refresh pipeline and report what was written.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.rates.refresh().await?;

    Ok(Json(json!({
        "message": "Refresh completed",
        "total_countries": report.summary.total,
        "fetched": report.fetched,
        "inserted": report.batch.inserted,
        "updated": report.batch.updated,
        "failed": report.batch.failures,
        "last_refreshed_at": report.refreshed_at,
    })))
}

/// GET /countries?region=Africa&currency=NGN&sort=gdp_desc
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let sort = query
        .sort
        .as_deref()
        .map(str::parse::<CountrySort>)
        .transpose()?;
    let params = ListCountriesParams {
        region: query.region,
        currency: query.currency,
        sort,
    };

    let countries = state
        .rates
        .run(move |r| r.countries().list(&params))
        .await?;
    Ok(Json(json!(countries)))
}

/// GET /countries/{name}
pub async fn get_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let country = state.rates.run(move |r| r.countries().get(&name)).await?;

    match country {
        Some(c) => Ok(Json(json!(c))),
        None => Err(AppError::not_found("Country not found")),
    }
}

/// DELETE /countries/{name}
pub async fn delete_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.rates.run(move |r| r.countries().delete(&name)).await?;
    Ok(Json(json!({ "message": "Country deleted" })))
}

/// GET /countries/image
///
/// Serve the most recent summary PNG.
pub async fn summary_image(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let path = state.rates.summary_path();
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::not_found("Summary image not found"))
        }
        Err(e) => Err(AppError::internal(format!("Could not read summary image: {e}"))),
    }
}
