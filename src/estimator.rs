//! GDP estimation from population and exchange rate.
//!
//! The estimate is a placeholder proxy: `population * k / rate` with `k`
//! drawn uniformly from `[GDP_SCALAR_MIN, GDP_SCALAR_MAX]` for every call.
//! Two refreshes of the same country will therefore store different values.

use crate::config::{GDP_SCALAR_MAX, GDP_SCALAR_MIN};
use rand::Rng;

/// Estimate GDP using the thread-local RNG.
///
/// - no currency code: `Some(0.0)`
/// - currency code but no usable rate: `None`
/// - otherwise: a value in `[population * 1000 / rate, population * 2000 / rate]`
pub fn estimate_gdp(
    population: Option<i64>,
    currency_code: Option<&str>,
    rate: Option<f64>,
) -> Option<f64> {
    estimate_gdp_with(&mut rand::thread_rng(), population, currency_code, rate)
}

/// Same as [`estimate_gdp`] with a caller-supplied RNG.
pub fn estimate_gdp_with<R: Rng + ?Sized>(
    rng: &mut R,
    population: Option<i64>,
    currency_code: Option<&str>,
    rate: Option<f64>,
) -> Option<f64> {
    if currency_code.is_none() {
        return Some(0.0);
    }
    let rate = rate.filter(|r| r.is_finite() && *r > 0.0)?;
    let scalar = rng.gen_range(GDP_SCALAR_MIN..=GDP_SCALAR_MAX) as f64;
    let population = population.unwrap_or(0) as f64;
    Some(population * (scalar / rate))
}
