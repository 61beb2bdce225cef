//! Deterministic synthetic history generation.
//!
//! Populates a [`ReadingStore`] with a facility roster and two meters per
//! facility, then generates daily cumulative readings with a seasonal
//! sine component (peaking in summer), a Friday multiplier, uniform
//! noise, and tiered electricity pricing. Fully reproducible for a fixed
//! seed, so derived statistics and forecasts are stable across runs.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};
use time::{Duration, Weekday};
use tracing::info;

use crate::config::DemoConfig;
use crate::model::{Reading, UtilityType};
use crate::store::ReadingStore;

/// Day-of-year offset that places the seasonal peak in midsummer.
const SEASON_PHASE_DAYS: f64 = 110.0;

/// Relative load boost at the seasonal peak (and cut at the trough).
const SEASON_AMPLITUDE: f64 = 0.5;

/// Load multiplier on Fridays, the busiest day.
const FRIDAY_MULTIPLIER: f64 = 1.3;

/// Minimum generated daily usage.
const USAGE_FLOOR: f64 = 1.0;

/// Capacity fraction contributing to electricity base load.
const ELECTRICITY_LOAD_FACTOR: f64 = 0.5;

/// Capacity fraction contributing to water base load.
const WATER_LOAD_FACTOR: f64 = 0.05;

/// Builds a store populated with the configured synthetic history.
///
/// Each facility receives one Electricity and one Water meter, each with
/// `days_history` consecutive daily readings starting at `start_date`.
/// Cumulative values and costs are rounded to two decimals like manually
/// entered data.
pub fn seed_store(cfg: &DemoConfig) -> ReadingStore {
    let mut store = ReadingStore::new();
    let mut rng = StdRng::seed_from_u64(cfg.seeding.seed);

    for fc in &cfg.facilities {
        let facility_id = store.add_facility(&fc.name, &fc.location, fc.capacity);

        for &utility in UtilityType::ALL {
            let meter_id = store
                .add_meter(facility_id, utility)
                .unwrap_or_else(|_| unreachable!("facility was just inserted"));

            let load_factor = match utility {
                UtilityType::Electricity => ELECTRICITY_LOAD_FACTOR,
                UtilityType::Water => WATER_LOAD_FACTOR,
            };
            let base_load = f64::from(fc.capacity) * load_factor;
            let mut value = cfg.seeding.start_value;

            for day in 0..cfg.seeding.days_history {
                let date = cfg.seeding.start_date + Duration::days(day as i64);

                let season =
                    ((f64::from(date.ordinal()) - SEASON_PHASE_DAYS) / 365.0 * TAU).sin();
                let season_multiplier = 1.0 + SEASON_AMPLITUDE * season;
                let friday_multiplier = if date.weekday() == Weekday::Friday {
                    FRIDAY_MULTIPLIER
                } else {
                    1.0
                };
                let noise: f64 = rng.random_range(0.9..1.1);

                let usage =
                    (base_load * season_multiplier * friday_multiplier * noise).max(USAGE_FLOOR);
                value += usage;

                let rate = match utility {
                    UtilityType::Electricity
                        if usage > cfg.pricing.electricity_tier_threshold =>
                    {
                        cfg.pricing.electricity_tier_rate
                    }
                    UtilityType::Electricity => cfg.pricing.electricity_rate,
                    UtilityType::Water => cfg.pricing.water_rate,
                };

                let reading = Reading {
                    meter_id,
                    date,
                    value: round2(value),
                    cost: round2(usage * rate),
                };
                store
                    .add_reading(reading)
                    .unwrap_or_else(|_| unreachable!("meter was just inserted"));
            }
        }
    }

    info!(
        facilities = cfg.facilities.len(),
        readings = store.reading_count(),
        "seeded synthetic history"
    );
    store
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
