/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Dispatches blocking store and refresh work to the blocking pool.
    pub rates: country_rates::AsyncCountryRates,
}
