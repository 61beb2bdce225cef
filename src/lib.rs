//! Facility utility-meter monitoring core.
//!
//! Turns cumulative Electricity/Water meter readings into daily
//! consumption series, aggregates them into cost and usage statistics,
//! and forecasts near-term usage with a linear trend fitted on a date
//! ordinal.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod consumption;
pub mod forecast;
pub mod ingest;
pub mod io;
pub mod model;
pub mod observability;
pub mod queries;
pub mod seed;
pub mod store;
