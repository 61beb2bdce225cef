//! Shared fixtures for integration tests.

use meterwatch::model::{MeterId, Reading, UtilityType};
use meterwatch::store::ReadingStore;
use time::Duration;
use time::macros::date;

/// Builds a store with one facility and one electricity meter holding
/// `days` cumulative readings starting 2024-01-01, where the usage on
/// day i is `5 + 2*i`.
#[allow(dead_code)]
pub fn linear_usage_store(days: u32) -> (ReadingStore, MeterId) {
    let mut store = ReadingStore::new();
    let facility = store.add_facility("Main Site", "Downtown", 800);
    let meter = store
        .add_meter(facility, UtilityType::Electricity)
        .expect("facility exists");

    let mut value = 1000.0;
    for i in 0..days {
        if i > 0 {
            value += 5.0 + 2.0 * f64::from(i);
        }
        store
            .add_reading(Reading {
                meter_id: meter,
                date: date!(2024 - 01 - 01) + Duration::days(i64::from(i)),
                value,
                cost: value * 0.18,
            })
            .expect("meter exists");
    }
    (store, meter)
}

/// Builds a store with two facilities, each with one meter of each
/// utility type, and three readings per meter.
#[allow(dead_code)]
pub fn two_facility_store() -> ReadingStore {
    let mut store = ReadingStore::new();
    let north = store.add_facility("North Plant", "North End", 500);
    let south = store.add_facility("South Plant", "South End", 300);

    for facility in [north, south] {
        for &utility in UtilityType::ALL {
            let meter = store.add_meter(facility, utility).expect("facility exists");
            let base = f64::from(meter) * 1000.0;
            for (i, delta) in [0.0, 40.0, 60.0].into_iter().enumerate() {
                store
                    .add_reading(Reading {
                        meter_id: meter,
                        date: date!(2024 - 03 - 01) + Duration::days(i as i64),
                        value: base + delta,
                        cost: 5.0,
                    })
                    .expect("meter exists");
            }
        }
    }
    store
}
