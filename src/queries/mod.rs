//! Read-side queries over the `countries` table.
//!
//! Query structs borrow the [`Connection`](crate::connection::Connection)
//! and return typed rows.

pub mod countries;

pub use countries::{CountryQuery, CountrySort, ListCountriesParams};
