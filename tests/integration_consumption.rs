//! End-to-end consumption pipeline tests: store, filtered queries,
//! derivation, aggregation, and CSV export.

mod common;

use meterwatch::config::DemoConfig;
use meterwatch::consumption::{AnomalyBand, Bucket, BucketKey, aggregate};
use meterwatch::io::export::write_csv;
use meterwatch::model::UtilityType;
use meterwatch::queries;
use meterwatch::seed::seed_store;
use meterwatch::store::ReadingFilter;
use time::macros::date;

#[test]
fn full_pipeline_on_worked_example() {
    let (store, _) = common::linear_usage_store(3);
    let points = queries::consumption_series(&store, &ReadingFilter::default());

    let deltas: Vec<f64> = points.iter().map(|p| p.daily_consumption).collect();
    assert_eq!(deltas, vec![0.0, 7.0, 9.0]);

    let stats = queries::summary_stats_for(&store, &ReadingFilter::default());
    assert_eq!(stats.count, 3);
    assert_eq!(stats.total_consumption, 16.0);
    assert!((stats.mean_daily_consumption - 16.0 / 3.0).abs() < 1e-9);
}

#[test]
fn filters_compose_as_conjunction() {
    let store = common::two_facility_store();

    // Water meters only, first facility only, last two days only.
    let filter = ReadingFilter {
        facility_ids: Some(vec![1]),
        utility_types: Some(vec![UtilityType::Water]),
        date_range: Some((date!(2024 - 03 - 02), date!(2024 - 03 - 03))),
    };
    let points = queries::consumption_series(&store, &filter);
    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| p.facility_id == 1));
    assert!(points.iter().all(|p| p.utility == UtilityType::Water));
    // First point inside the window zero-fills even though earlier
    // readings exist outside it.
    assert_eq!(points[0].daily_consumption, 0.0);
    assert_eq!(points[1].daily_consumption, 20.0);
}

#[test]
fn unmatched_filter_yields_empty_series_and_zero_stats() {
    let store = common::two_facility_store();
    let filter = ReadingFilter {
        facility_ids: Some(vec![99]),
        ..ReadingFilter::default()
    };
    assert!(queries::consumption_series(&store, &filter).is_empty());
    let stats = queries::summary_stats_for(&store, &filter);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.mean_daily_consumption, 0.0);
    assert_eq!(
        queries::anomaly_indicator_for(&store, &filter).band,
        AnomalyBand::Low
    );
}

#[test]
fn monthly_aggregation_spans_month_boundary() {
    let (store, _) = common::linear_usage_store(40);
    let points = queries::consumption_series(&store, &ReadingFilter::default());
    let agg = aggregate(&points, Bucket::Month);
    assert_eq!(agg.len(), 2);
    assert_eq!(
        agg[0].bucket,
        BucketKey::Month {
            year: 2024,
            month: 1
        }
    );
    assert_eq!(
        agg[1].bucket,
        BucketKey::Month {
            year: 2024,
            month: 2
        }
    );
    // Total across buckets equals the series total.
    let total: f64 = agg.iter().map(|a| a.consumption).sum();
    let stats = queries::summary_stats_for(&store, &ReadingFilter::default());
    assert!((total - stats.total_consumption).abs() < 1e-9);
}

#[test]
fn repeated_queries_return_identical_results() {
    let store = common::two_facility_store();
    let filter = ReadingFilter::default();
    let first = queries::consumption_series(&store, &filter);
    let second = queries::consumption_series(&store, &filter);
    assert_eq!(first, second);
}

#[test]
fn seeded_demo_data_flows_through_the_pipeline() {
    let cfg = DemoConfig::compact();
    let store = seed_store(&cfg);
    let points = queries::consumption_series(&store, &ReadingFilter::default());
    assert_eq!(points.len(), store.reading_count());

    // Exactly one zero-fill point per meter.
    let zero_fills = points.iter().filter(|p| p.daily_consumption == 0.0).count();
    assert_eq!(zero_fills, store.meters().count());

    let stats = queries::summary_stats_for(&store, &ReadingFilter::default());
    assert!(stats.total_consumption > 0.0);
    assert!(stats.total_cost > 0.0);
}

#[test]
fn meter_removal_cascades_into_derived_series() {
    let mut store = common::two_facility_store();
    let before = queries::consumption_series(&store, &ReadingFilter::default()).len();
    let victim = store.meters().next().map(|m| m.id).unwrap();
    store.remove_meter(victim).unwrap();
    let after = queries::consumption_series(&store, &ReadingFilter::default());
    assert_eq!(after.len(), before - 3);
    assert!(after.iter().all(|p| p.meter_id != victim));
}

#[test]
fn exported_csv_carries_derived_deltas() {
    let (store, _) = common::linear_usage_store(5);
    let points = queries::consumption_series(&store, &ReadingFilter::default());

    let mut buf = Vec::new();
    write_csv(&points, &mut buf).unwrap();
    let output = String::from_utf8(buf).unwrap();

    let mut lines = output.lines();
    assert_eq!(
        lines.next(),
        Some("date,value,cost,meter_id,facility_id,type,daily_consumption")
    );
    assert_eq!(lines.clone().count(), 5);
    // First data row carries the zero-fill delta.
    assert!(lines.next().unwrap().ends_with(",0.00"));
}
