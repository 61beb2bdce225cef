//! Consumption derivation and aggregation: turns cumulative readings into
//! daily consumption points, bucketed sums, summary statistics, and the
//! fixed-band anomaly indicator.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use time::Date;

use crate::model::{FacilityId, MeterId, UtilityType};
use crate::store::ReadingRow;

/// Gauge reference value for the anomaly indicator.
pub const ANOMALY_BASELINE: f64 = 250.0;

/// Upper bound (exclusive) of the low anomaly band.
pub const BAND_LOW_MAX: f64 = 200.0;

/// Upper bound (exclusive) of the medium anomaly band.
pub const BAND_MEDIUM_MAX: f64 = 350.0;

/// One derived consumption row: a reading annotated with the day-over-day
/// delta against the previous reading of the same meter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionPoint {
    /// Observation date.
    pub date: Date,
    /// Cumulative meter value at this date.
    pub value: f64,
    /// Cost attributed to this reading.
    pub cost: f64,
    /// Meter the point belongs to.
    pub meter_id: MeterId,
    /// Facility owning the meter.
    pub facility_id: FacilityId,
    /// Utility type of the meter.
    pub utility: UtilityType,
    /// `value` minus the previous reading of the same meter; 0 for the
    /// first reading of a meter within the derivation window.
    pub daily_consumption: f64,
}

/// Time bucket for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Day,
    Month,
}

/// Grouping key of one aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BucketKey {
    /// Calendar-day bucket.
    Day(Date),
    /// Calendar-month bucket, simple `(year, month)` truncation.
    Month { year: i32, month: u8 },
}

/// Summed consumption and cost for one `(bucket, utility)` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// Time bucket this row covers.
    pub bucket: BucketKey,
    /// Utility type grouped on.
    pub utility: UtilityType,
    /// Sum of `daily_consumption` in the group.
    pub consumption: f64,
    /// Sum of `cost` in the group.
    pub cost: f64,
}

/// Totals over a consumption series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Sum of `daily_consumption` over all points.
    pub total_consumption: f64,
    /// Sum of `cost` over all points.
    pub total_cost: f64,
    /// Number of points.
    pub count: usize,
    /// `total_consumption / count`, 0 when the series is empty.
    pub mean_daily_consumption: f64,
}

/// Fixed-threshold classification of mean daily consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyBand {
    /// Below [`BAND_LOW_MAX`].
    Low,
    /// [`BAND_LOW_MAX`] up to [`BAND_MEDIUM_MAX`].
    Medium,
    /// [`BAND_MEDIUM_MAX`] and above.
    High,
}

/// Mean daily consumption against the fixed gauge baseline and bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyIndicator {
    /// Observed mean daily consumption.
    pub value: f64,
    /// Fixed reference value ([`ANOMALY_BASELINE`]).
    pub baseline: f64,
    /// Band the value falls into.
    pub band: AnomalyBand,
}

/// Derives daily consumption from date-ordered joined readings.
///
/// Differencing is groupwise per meter while preserving the input row
/// order, so a multi-meter date-sorted sequence and a single-meter
/// sequence are both handled: each row's `daily_consumption` is its value
/// minus the previous value seen for the *same* meter, and the first row
/// of each meter in the window yields 0. That zero-fill is a deliberate
/// boundary policy (no prior value is available inside the window), not a
/// data artifact.
///
/// Rows must be ascending by date per meter (store retrieval guarantees
/// this); negative deltas from meter rollover or corrected entries pass
/// through unmodified.
///
/// The derivation is a pure function of its input: repeated calls on the
/// same rows produce identical output.
pub fn derive_daily(rows: &[ReadingRow]) -> Vec<ConsumptionPoint> {
    let mut previous: HashMap<MeterId, f64> = HashMap::new();
    #[cfg(debug_assertions)]
    let mut last_date: HashMap<MeterId, Date> = HashMap::new();

    rows.iter()
        .map(|r| {
            #[cfg(debug_assertions)]
            {
                if let Some(prev) = last_date.insert(r.meter_id, r.date) {
                    debug_assert!(
                        prev <= r.date,
                        "rows for meter {} must be ascending by date",
                        r.meter_id
                    );
                }
            }
            let daily = match previous.insert(r.meter_id, r.value) {
                Some(prev_value) => r.value - prev_value,
                None => 0.0,
            };
            ConsumptionPoint {
                date: r.date,
                value: r.value,
                cost: r.cost,
                meter_id: r.meter_id,
                facility_id: r.facility_id,
                utility: r.utility,
                daily_consumption: daily,
            }
        })
        .collect()
}

/// Sums consumption and cost per `(bucket, utility)` group.
///
/// Output rows are sorted by bucket key, then utility, so identical
/// inputs always aggregate to identical output.
pub fn aggregate(points: &[ConsumptionPoint], bucket: Bucket) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(BucketKey, UtilityType), (f64, f64)> = BTreeMap::new();
    for p in points {
        let key = match bucket {
            Bucket::Day => BucketKey::Day(p.date),
            Bucket::Month => BucketKey::Month {
                year: p.date.year(),
                month: u8::from(p.date.month()),
            },
        };
        let entry = groups.entry((key, p.utility)).or_insert((0.0, 0.0));
        entry.0 += p.daily_consumption;
        entry.1 += p.cost;
    }
    groups
        .into_iter()
        .map(|((bucket, utility), (consumption, cost))| AggregateRow {
            bucket,
            utility,
            consumption,
            cost,
        })
        .collect()
}

/// Computes totals over a consumption series.
///
/// The empty series yields all-zero stats rather than a division by zero.
pub fn summary_stats(points: &[ConsumptionPoint]) -> SummaryStats {
    let total_consumption: f64 = points.iter().map(|p| p.daily_consumption).sum();
    let total_cost: f64 = points.iter().map(|p| p.cost).sum();
    let count = points.len();
    let mean_daily_consumption = if count == 0 {
        0.0
    } else {
        total_consumption / count as f64
    };
    SummaryStats {
        total_consumption,
        total_cost,
        count,
        mean_daily_consumption,
    }
}

/// Classifies mean daily consumption against the fixed gauge thresholds.
///
/// Thresholds are deliberately global (not per facility or meter type),
/// matching the dashboard gauge: below 200 low, 200 to 350 medium, 350
/// and above high.
pub fn anomaly_indicator(mean_daily_consumption: f64) -> AnomalyIndicator {
    let band = if mean_daily_consumption < BAND_LOW_MAX {
        AnomalyBand::Low
    } else if mean_daily_consumption < BAND_MEDIUM_MAX {
        AnomalyBand::Medium
    } else {
        AnomalyBand::High
    };
    AnomalyIndicator {
        value: mean_daily_consumption,
        baseline: ANOMALY_BASELINE,
        band,
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary ---")?;
        writeln!(f, "Total consumption: {:.2}", self.total_consumption)?;
        writeln!(f, "Total cost:        {:.2}", self.total_cost)?;
        writeln!(f, "Readings:          {}", self.count)?;
        write!(f, "Mean daily usage:  {:.2}", self.mean_daily_consumption)
    }
}

impl fmt::Display for AnomalyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyBand::Low => write!(f, "low"),
            AnomalyBand::Medium => write!(f, "medium"),
            AnomalyBand::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for AnomalyIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean daily usage {:.2} vs baseline {:.1} ({} band)",
            self.value, self.baseline, self.band
        )
    }
}
