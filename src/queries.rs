//! Boundary queries the presentation layer calls into the core.
//!
//! Each query is one synchronous fetch-and-transform over the store: no
//! caching, no hidden state, identical inputs always yield identical
//! results. Repeated dashboard renders may recompute freely.

use tracing::debug;

use crate::consumption::{
    AnomalyIndicator, ConsumptionPoint, SummaryStats, anomaly_indicator, derive_daily,
    summary_stats,
};
use crate::forecast::{Forecast, forecast_series};
use crate::model::MeterId;
use crate::store::{ReadingFilter, ReadingStore, StoreError};

/// Derived consumption series for all readings matching the filter.
///
/// Rows are date-ordered; differencing is per meter within the filtered
/// window, so the first matching reading of each meter carries a zero
/// delta.
pub fn consumption_series(store: &ReadingStore, filter: &ReadingFilter) -> Vec<ConsumptionPoint> {
    let rows = store.query(filter);
    debug!(rows = rows.len(), "derived consumption series");
    derive_daily(&rows)
}

/// Summary statistics over the filtered consumption series.
pub fn summary_stats_for(store: &ReadingStore, filter: &ReadingFilter) -> SummaryStats {
    summary_stats(&consumption_series(store, filter))
}

/// Anomaly indicator over the filtered consumption series.
pub fn anomaly_indicator_for(store: &ReadingStore, filter: &ReadingFilter) -> AnomalyIndicator {
    anomaly_indicator(summary_stats_for(store, filter).mean_daily_consumption)
}

/// Forecast for one meter's full derived history.
///
/// `Ok(None)` signals insufficient history (fewer than the minimum
/// points), letting the caller show a "not enough data" state rather than
/// treating it as a failure.
///
/// # Errors
///
/// Returns `StoreError::MeterNotFound` if `meter_id` is unknown.
pub fn forecast_for(
    store: &ReadingStore,
    meter_id: MeterId,
    horizon_days: u32,
) -> Result<Option<Forecast>, StoreError> {
    let readings = store.readings_for(meter_id)?;

    let mut series = Vec::with_capacity(readings.len());
    let mut prev: Option<f64> = None;
    for r in &readings {
        let usage = prev.map_or(0.0, |p| r.value - p);
        series.push((r.date, usage));
        prev = Some(r.value);
    }

    let forecast = forecast_series(&series, horizon_days);
    debug!(
        meter_id,
        readings = readings.len(),
        fitted = forecast.is_some(),
        "forecast computed"
    );
    Ok(forecast)
}
