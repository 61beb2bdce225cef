//! Linear-trend usage forecasting.
//!
//! Fits ordinary least squares of daily consumption against a date
//! ordinal, scores the fit with in-sample R², and extrapolates the line
//! over a fixed future horizon. Deliberately a one-dimensional trend, not
//! a seasonal model; R² is the caller's trust signal for how much of the
//! series the trend actually explains.

use std::fmt;

use serde::Serialize;
use time::{Date, Duration};

/// Minimum number of points a series needs before a fit is attempted.
pub const MIN_HISTORY_POINTS: usize = 30;

/// Default number of future days a forecast projects.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Predicted usage must exceed historical mean by this factor to trigger
/// the anomaly warning.
pub const WARNING_FACTOR: f64 = 1.2;

/// Which series a forecast point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesLabel {
    Historical,
    Predicted,
}

/// One point of a forecast chart: observed or projected daily usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Calendar date of the point.
    pub date: Date,
    /// Daily usage, observed or projected.
    pub usage: f64,
    /// Series the point belongs to.
    pub label: SeriesLabel,
}

/// A fitted linear trend over a daily consumption series.
///
/// Stateless once fitted: prediction is a pure evaluation of the line at
/// future ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTrend {
    /// Usage change per day.
    pub slope: f64,
    /// Line value at ordinal zero.
    pub intercept: f64,
    /// In-sample coefficient of determination of the training series.
    pub accuracy: f64,
    /// Last historical date; predictions start the day after.
    pub last_date: Date,
    /// Mean usage of the training series, the warning baseline.
    pub historical_mean: f64,
}

/// Complete forecast bundle for one meter's derived daily series.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    /// Training series points, labeled [`SeriesLabel::Historical`].
    pub historical: Vec<ForecastPoint>,
    /// Projected points, labeled [`SeriesLabel::Predicted`].
    pub predicted: Vec<ForecastPoint>,
    /// Arithmetic mean of predicted usage over the horizon.
    pub mean_predicted: f64,
    /// Mean usage of the training series.
    pub historical_mean: f64,
    /// In-sample R² of the fitted trend.
    pub accuracy: f64,
    /// Whether predicted mean exceeds historical mean by [`WARNING_FACTOR`].
    pub warning_triggered: bool,
}

impl LinearTrend {
    /// Fits a linear trend to one meter's derived daily series.
    ///
    /// The input is the full derived sequence for a meter, ascending by
    /// date and including the leading zero-fill point; that first point
    /// carries no consumption information and is dropped before
    /// regression. The sole feature is the julian-day ordinal of each
    /// date.
    ///
    /// Returns `None` when the series has fewer than
    /// [`MIN_HISTORY_POINTS`] points. Insufficient history is an expected
    /// state, not a failure.
    pub fn fit(series: &[(Date, f64)]) -> Option<Self> {
        if series.len() < MIN_HISTORY_POINTS {
            return None;
        }
        let train = &series[1..];

        let n = train.len() as f64;
        let xs = |d: Date| f64::from(d.to_julian_day());
        let x_mean = train.iter().map(|(d, _)| xs(*d)).sum::<f64>() / n;
        let y_mean = train.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (d, y) in train {
            let dx = xs(*d) - x_mean;
            sxx += dx * dx;
            sxy += dx * (y - y_mean);
        }
        // All readings on one date: flat line through the mean.
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = y_mean - slope * x_mean;

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (d, y) in train {
            let fitted = slope * xs(*d) + intercept;
            ss_res += (y - fitted) * (y - fitted);
            ss_tot += (y - y_mean) * (y - y_mean);
        }
        let accuracy = r_squared(ss_res, ss_tot);

        let last_date = train.last().map(|(d, _)| *d)?;
        Some(Self {
            slope,
            intercept,
            accuracy,
            last_date,
            historical_mean: y_mean,
        })
    }

    /// Evaluates the fitted line at a single date.
    pub fn value_at(&self, date: Date) -> f64 {
        self.slope * f64::from(date.to_julian_day()) + self.intercept
    }

    /// Projects the fitted line over a future horizon.
    ///
    /// Produces exactly `horizon_days` points with strictly increasing
    /// dates, starting the day after the last historical date. Projected
    /// values may be negative; the engine applies no floor, and clamping
    /// is a downstream presentation choice.
    pub fn predict(&self, horizon_days: u32) -> Vec<ForecastPoint> {
        (1..=i64::from(horizon_days))
            .map(|offset| {
                let date = self.last_date + Duration::days(offset);
                ForecastPoint {
                    date,
                    usage: self.value_at(date),
                    label: SeriesLabel::Predicted,
                }
            })
            .collect()
    }
}

/// Coefficient of determination from residual and total sums of squares.
///
/// A zero-variance target scores 1.0 when residuals are zero and 0.0
/// otherwise.
fn r_squared(ss_res: f64, ss_tot: f64) -> f64 {
    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Arithmetic mean of predicted usage over a forecast horizon.
///
/// Returns 0 for an empty horizon.
pub fn mean_predicted(points: &[ForecastPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.usage).sum::<f64>() / points.len() as f64
}

/// Fixed 20%-over-baseline anomaly rule.
///
/// Triggered iff `mean_predicted > historical_mean * 1.2`.
pub fn anomaly_warning(mean_predicted: f64, historical_mean: f64) -> bool {
    mean_predicted > historical_mean * WARNING_FACTOR
}

/// Fits and projects one meter's derived daily series in a single step.
///
/// Returns `None` when the series is below the minimum history. The
/// historical half of the bundle excludes the dropped leading zero-fill
/// point, matching the training series.
pub fn forecast_series(series: &[(Date, f64)], horizon_days: u32) -> Option<Forecast> {
    let trend = LinearTrend::fit(series)?;

    let historical: Vec<ForecastPoint> = series[1..]
        .iter()
        .map(|(date, usage)| ForecastPoint {
            date: *date,
            usage: *usage,
            label: SeriesLabel::Historical,
        })
        .collect();
    let predicted = trend.predict(horizon_days);
    let mean = mean_predicted(&predicted);

    Some(Forecast {
        warning_triggered: anomaly_warning(mean, trend.historical_mean),
        mean_predicted: mean,
        historical_mean: trend.historical_mean,
        accuracy: trend.accuracy,
        historical,
        predicted,
    })
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast ---")?;
        writeln!(f, "Model accuracy (R²):   {:.2}", self.accuracy)?;
        writeln!(f, "Mean predicted usage:  {:.2}", self.mean_predicted)?;
        writeln!(f, "Historical mean usage: {:.2}", self.historical_mean)?;
        write!(
            f,
            "Warning:               {}",
            if self.warning_triggered {
                "predicted usage exceeds historical mean by more than 20%"
            } else {
                "within normal range"
            }
        )
    }
}
