//! Country query tests against seeded sample rows.

mod common;

use country_rates::queries::{CountrySort, ListCountriesParams};
use country_rates::upsert::UpsertEngine;
use country_rates::CountryRatesError;

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_defaults_to_name_order() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let all = rates.countries().list(&ListCountriesParams::default()).unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Antarctica", "France", "Germany", "Japan", "Nepal"]);
}

#[test]
fn region_filter_returns_only_that_region() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let europe = rates
        .countries()
        .list(&ListCountriesParams {
            region: Some("europe".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(europe.len(), 2);
    assert!(europe.iter().all(|c| c.region.as_deref() == Some("Europe")));
}

#[test]
fn currency_filter_matches_code() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let eur = rates
        .countries()
        .list(&ListCountriesParams {
            currency: Some("EUR".to_string()),
            region: Some("Europe".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(eur.len(), 2);

    let none = rates
        .countries()
        .list(&ListCountriesParams {
            currency: Some("EUR".to_string()),
            region: Some("Asia".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn gdp_desc_puts_nulls_last_and_is_non_increasing() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let sorted = rates
        .countries()
        .list(&ListCountriesParams {
            sort: Some(CountrySort::GdpDesc),
            ..Default::default()
        })
        .unwrap();

    let gdps: Vec<Option<f64>> = sorted.iter().map(|c| c.estimated_gdp).collect();
    let first_null = gdps.iter().position(|g| g.is_none()).unwrap();
    assert!(gdps[first_null..].iter().all(|g| g.is_none()));

    let known: Vec<f64> = gdps[..first_null].iter().map(|g| g.unwrap()).collect();
    assert!(known.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(sorted[0].name, "Japan");
    assert_eq!(sorted.last().unwrap().name, "Nepal");
}

#[test]
fn gdp_asc_also_puts_nulls_last() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let sorted = rates
        .countries()
        .list(&ListCountriesParams {
            sort: Some(CountrySort::GdpAsc),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(sorted[0].name, "Antarctica");
    assert_eq!(sorted.last().unwrap().name, "Nepal");
}

#[test]
fn sort_parses_from_query_strings() {
    assert_eq!("gdp_desc".parse::<CountrySort>().unwrap(), CountrySort::GdpDesc);
    assert_eq!("GDP_ASC".parse::<CountrySort>().unwrap(), CountrySort::GdpAsc);
    assert_eq!("name".parse::<CountrySort>().unwrap(), CountrySort::NameAsc);
    assert!(matches!(
        "sideways".parse::<CountrySort>(),
        Err(CountryRatesError::InvalidArgument(_))
    ));
}

// ---------------------------------------------------------------------------
// get / delete
// ---------------------------------------------------------------------------

#[test]
fn get_is_case_insensitive() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let japan = rates.countries().get("jApAn").unwrap().unwrap();
    assert_eq!(japan.name, "Japan");
    assert_eq!(japan.currency_code.as_deref(), Some("JPY"));
    assert_eq!(japan.created_at, common::ts(0));

    assert!(rates.countries().get("Atlantis").unwrap().is_none());
}

#[test]
fn delete_removes_row_and_reports_missing() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    rates.countries().delete("france").unwrap();
    assert!(rates.countries().get("France").unwrap().is_none());
    assert_eq!(rates.countries().count().unwrap(), 4);

    let err = rates.countries().delete("France").unwrap_err();
    assert!(matches!(err, CountryRatesError::NotFound(_)));
}

#[test]
fn exact_key_wins_over_other_spellings() {
    let (rates, _tmp) = common::setup_rates();
    let engine = UpsertEngine::new(rates.connection());
    engine
        .upsert(&common::record("france", "Europe", Some("EUR"), Some(1_000.0)))
        .unwrap();
    engine
        .upsert(&common::record("France", "Europe", Some("EUR"), Some(2_000.0)))
        .unwrap();
    assert_eq!(rates.countries().count().unwrap(), 2);

    for _ in 0..5 {
        let upper = rates.countries().get("France").unwrap().unwrap();
        assert_eq!(upper.name, "France");
        assert_eq!(upper.estimated_gdp, Some(2_000.0));
        let lower = rates.countries().get("france").unwrap().unwrap();
        assert_eq!(lower.name, "france");
    }

    // No exact key: first spelling in name order.
    let fallback = rates.countries().get("FRANCE").unwrap().unwrap();
    assert_eq!(fallback.name, "France");

    rates.countries().delete("France").unwrap();
    assert_eq!(rates.countries().count().unwrap(), 1);
    let left = rates.countries().get("France").unwrap().unwrap();
    assert_eq!(left.name, "france");

    rates.countries().delete("FRANCE").unwrap();
    assert_eq!(rates.countries().count().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// aggregates
// ---------------------------------------------------------------------------

#[test]
fn top_by_gdp_limits_and_orders() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let top = rates.countries().top_by_gdp(3).unwrap();
    let names: Vec<&str> = top.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Japan", "Germany", "France"]);
}

#[test]
fn status_on_empty_store() {
    let (rates, _tmp) = common::setup_rates();
    let status = rates.status().unwrap();
    assert_eq!(status.total_countries, 0);
    assert_eq!(status.last_refreshed_at, None);
}

#[test]
fn status_reports_latest_refresh() {
    let (rates, _tmp) = common::setup_rates();
    common::seed_sample_rows(&rates);

    let mut newer = common::record("Kenya", "Africa", Some("KES"), Some(1.0));
    newer.last_refreshed_at = common::ts(120);
    country_rates::upsert::UpsertEngine::new(rates.connection())
        .upsert(&newer)
        .unwrap();

    let status = rates.status().unwrap();
    assert_eq!(status.total_countries, 6);
    assert_eq!(status.last_refreshed_at, Some(common::ts(120)));
}
