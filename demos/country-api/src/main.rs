mod error;
mod routes;
mod settings;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use settings::Settings;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;

    let mut builder = country_rates::AsyncCountryRates::builder()
        .countries_url(&settings.sources.countries_url)
        .rates_url(&settings.sources.rates_url)
        .base_currency(&settings.sources.base_currency)
        .timeout(std::time::Duration::from_secs(settings.sources.timeout_secs))
        .pool_size(settings.database.pool_size);
    if let Some(ref dir) = settings.database.data_dir {
        builder = builder.data_dir(dir);
    }
    let rates = builder.build().await?;
    tracing::info!(summary = %rates.summary_path().display(), "store ready");

    let state = Arc::new(AppState { rates });

    let app = Router::new()
        .route("/countries/refresh", post(routes::countries::refresh))
        .route("/countries", get(routes::countries::list_countries))
        .route("/countries/image", get(routes::countries::summary_image))
        .route(
            "/countries/{name}",
            get(routes::countries::get_country).delete(routes::countries::delete_country),
        )
        .route("/status", get(routes::status::get_status))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
