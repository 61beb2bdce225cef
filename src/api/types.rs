//! API query and response types.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::consumption::{AnomalyIndicator, SummaryStats};
use crate::forecast::{Forecast, ForecastPoint};
use crate::model::{DATE_FORMAT, MeterId, UtilityType};
use crate::store::ReadingFilter;

/// Optional filter query parameters shared by the summary and series
/// endpoints.
///
/// `facility` and `utility` take comma-separated lists; `start`/`end`
/// take ISO dates and form an inclusive range, each side optional.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// Comma-separated facility ids.
    pub facility: Option<String>,
    /// Comma-separated utility types.
    pub utility: Option<String>,
    /// Inclusive range start (ISO date).
    pub start: Option<String>,
    /// Inclusive range end (ISO date).
    pub end: Option<String>,
}

impl FilterQuery {
    /// Converts the raw query parameters into a reading filter.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first malformed parameter.
    pub fn to_filter(&self) -> Result<ReadingFilter, String> {
        let facility_ids = self
            .facility
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|s| {
                        s.trim()
                            .parse()
                            .map_err(|_| format!("\"{s}\" is not a valid facility id"))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let utility_types = self
            .utility
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.parse::<UtilityType>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let parse_date = |raw: &str| {
            Date::parse(raw, DATE_FORMAT)
                .map_err(|e| format!("\"{raw}\" is not a valid date: {e}"))
        };
        let date_range = match (self.start.as_deref(), self.end.as_deref()) {
            (None, None) => None,
            (start, end) => {
                let start = start.map(parse_date).transpose()?.unwrap_or(Date::MIN);
                let end = end.map(parse_date).transpose()?.unwrap_or(Date::MAX);
                if start > end {
                    return Err(format!("start ({start}) must be <= end ({end})"));
                }
                Some((start, end))
            }
        };

        Ok(ReadingFilter {
            facility_ids,
            utility_types,
            date_range,
        })
    }
}

/// Horizon parameter for the forecast endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Number of future days to project (default 30).
    pub horizon: Option<u32>,
}

/// Combined summary response: totals plus the anomaly gauge.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Totals over the filtered consumption series.
    pub stats: SummaryStats,
    /// Mean daily consumption against the fixed bands.
    pub anomaly: AnomalyIndicator,
}

/// Forecast response for one meter.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Meter the forecast belongs to.
    pub meter_id: MeterId,
    /// Number of projected days.
    pub horizon_days: u32,
    /// In-sample R² of the fitted trend.
    pub accuracy: f64,
    /// Mean projected usage over the horizon.
    pub mean_predicted: f64,
    /// Mean usage of the training series.
    pub historical_mean: f64,
    /// Whether the 20%-over-baseline warning fired.
    pub warning_triggered: bool,
    /// Training series points.
    pub historical: Vec<ForecastPoint>,
    /// Projected points.
    pub predicted: Vec<ForecastPoint>,
}

impl ForecastResponse {
    /// Builds a response from a computed forecast bundle.
    pub fn from_forecast(meter_id: MeterId, horizon_days: u32, fc: Forecast) -> Self {
        Self {
            meter_id,
            horizon_days,
            accuracy: fc.accuracy,
            mean_predicted: fc.mean_predicted,
            historical_mean: fc.historical_mean,
            warning_triggered: fc.warning_triggered,
            historical: fc.historical,
            predicted: fc.predicted,
        }
    }
}

/// Reply when a meter has too little history to fit a trend.
///
/// This is an expected state, not an error: the client shows a "not
/// enough data" message.
#[derive(Debug, Serialize)]
pub struct InsufficientHistoryResponse {
    /// Always true; discriminates the reply shape.
    pub insufficient_history: bool,
    /// Readings available for the meter.
    pub reading_count: usize,
    /// Minimum readings required for a fit.
    pub required: usize,
}

/// Error response body for 4xx-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn empty_query_maps_to_pass_all_filter() {
        let filter = FilterQuery::default().to_filter().unwrap();
        assert!(filter.facility_ids.is_none());
        assert!(filter.utility_types.is_none());
        assert!(filter.date_range.is_none());
    }

    #[test]
    fn comma_separated_lists_parse() {
        let q = FilterQuery {
            facility: Some("1, 2,3".to_string()),
            utility: Some("Electricity,Water".to_string()),
            start: None,
            end: None,
        };
        let filter = q.to_filter().unwrap();
        assert_eq!(filter.facility_ids, Some(vec![1, 2, 3]));
        assert_eq!(
            filter.utility_types,
            Some(vec![UtilityType::Electricity, UtilityType::Water])
        );
    }

    #[test]
    fn open_ended_range_uses_extremes() {
        let q = FilterQuery {
            start: Some("2024-01-01".to_string()),
            ..FilterQuery::default()
        };
        let filter = q.to_filter().unwrap();
        assert_eq!(
            filter.date_range,
            Some((date!(2024 - 01 - 01), Date::MAX))
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let q = FilterQuery {
            start: Some("2024-02-01".to_string()),
            end: Some("2024-01-01".to_string()),
            ..FilterQuery::default()
        };
        assert!(q.to_filter().is_err());
    }

    #[test]
    fn bad_utility_is_rejected() {
        let q = FilterQuery {
            utility: Some("gas".to_string()),
            ..FilterQuery::default()
        };
        assert!(q.to_filter().is_err());
    }
}
