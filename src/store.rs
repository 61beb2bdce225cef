//! In-memory reading store: facility/meter catalogs plus the append-only
//! reading log, with ordered retrieval and filtered joins.
//!
//! The store is an explicit value owned by the caller; engines borrow it
//! for the duration of one operation. All retrieval methods are read-only
//! and return fully materialized, date-ordered sequences. Mutation methods
//! exist for the surrounding CRUD layer that maintains the log.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::model::{Facility, FacilityId, Meter, MeterId, Reading, UtilityType};

/// Reference to a meter or facility that does not exist in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("meter {0} not found")]
    MeterNotFound(MeterId),
    #[error("facility {0} not found")]
    FacilityNotFound(FacilityId),
}

/// Conjunction of optional reading predicates.
///
/// Omitted predicates pass all rows; the date range is inclusive on both
/// ends.
#[derive(Debug, Clone, Default)]
pub struct ReadingFilter {
    /// Restrict to readings of meters owned by these facilities.
    pub facility_ids: Option<Vec<FacilityId>>,
    /// Restrict to meters of these utility types.
    pub utility_types: Option<Vec<UtilityType>>,
    /// Inclusive `(start, end)` date window.
    pub date_range: Option<(Date, Date)>,
}

/// A reading joined with its owning meter and facility metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingRow {
    /// Observation date.
    pub date: Date,
    /// Cumulative meter value.
    pub value: f64,
    /// Cost attributed to this reading.
    pub cost: f64,
    /// Meter the reading belongs to.
    pub meter_id: MeterId,
    /// Facility owning the meter.
    pub facility_id: FacilityId,
    /// Utility type of the meter.
    pub utility: UtilityType,
}

/// Facility/meter catalogs and the append-only cumulative reading log.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    facilities: BTreeMap<FacilityId, Facility>,
    meters: BTreeMap<MeterId, Meter>,
    readings: Vec<Reading>,
    next_facility_id: FacilityId,
    next_meter_id: MeterId,
}

impl ReadingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a facility and returns its assigned id.
    ///
    /// Ids are assigned sequentially starting at 1.
    pub fn add_facility(&mut self, name: &str, location: &str, capacity: u32) -> FacilityId {
        self.next_facility_id += 1;
        let id = self.next_facility_id;
        self.facilities.insert(
            id,
            Facility {
                id,
                name: name.to_string(),
                location: location.to_string(),
                capacity,
            },
        );
        id
    }

    /// Registers a meter under an existing facility and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FacilityNotFound` if `facility_id` is unknown.
    pub fn add_meter(
        &mut self,
        facility_id: FacilityId,
        utility: UtilityType,
    ) -> Result<MeterId, StoreError> {
        if !self.facilities.contains_key(&facility_id) {
            return Err(StoreError::FacilityNotFound(facility_id));
        }
        self.next_meter_id += 1;
        let id = self.next_meter_id;
        self.meters.insert(
            id,
            Meter {
                id,
                facility_id,
                utility,
            },
        );
        Ok(id)
    }

    /// Appends a single reading to the log.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MeterNotFound` if the reading references an
    /// unknown meter.
    pub fn add_reading(&mut self, reading: Reading) -> Result<(), StoreError> {
        if !self.meters.contains_key(&reading.meter_id) {
            return Err(StoreError::MeterNotFound(reading.meter_id));
        }
        self.readings.push(reading);
        Ok(())
    }

    /// Appends a batch of readings atomically.
    ///
    /// Every meter reference is validated before anything is inserted, so
    /// a failing batch leaves the log unchanged. Returns the number of
    /// readings appended.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MeterNotFound` for the first unknown meter id.
    pub fn append_readings(&mut self, batch: Vec<Reading>) -> Result<usize, StoreError> {
        for r in &batch {
            if !self.meters.contains_key(&r.meter_id) {
                return Err(StoreError::MeterNotFound(r.meter_id));
            }
        }
        let count = batch.len();
        self.readings.extend(batch);
        Ok(count)
    }

    /// Deletes a meter and all of its readings (composition cascade).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MeterNotFound` if `meter_id` is unknown.
    pub fn remove_meter(&mut self, meter_id: MeterId) -> Result<(), StoreError> {
        if self.meters.remove(&meter_id).is_none() {
            return Err(StoreError::MeterNotFound(meter_id));
        }
        self.readings.retain(|r| r.meter_id != meter_id);
        Ok(())
    }

    /// Deletes a facility, its meters, and their readings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FacilityNotFound` if `facility_id` is unknown.
    pub fn remove_facility(&mut self, facility_id: FacilityId) -> Result<(), StoreError> {
        if self.facilities.remove(&facility_id).is_none() {
            return Err(StoreError::FacilityNotFound(facility_id));
        }
        let owned: Vec<MeterId> = self
            .meters
            .values()
            .filter(|m| m.facility_id == facility_id)
            .map(|m| m.id)
            .collect();
        for id in &owned {
            self.meters.remove(id);
        }
        self.readings.retain(|r| !owned.contains(&r.meter_id));
        Ok(())
    }

    /// All facilities in id order.
    pub fn facilities(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.values()
    }

    /// All meters in id order.
    pub fn meters(&self) -> impl Iterator<Item = &Meter> {
        self.meters.values()
    }

    /// Looks up a meter by id.
    pub fn meter(&self, meter_id: MeterId) -> Option<&Meter> {
        self.meters.get(&meter_id)
    }

    /// Looks up a facility by id.
    pub fn facility(&self, facility_id: FacilityId) -> Option<&Facility> {
        self.facilities.get(&facility_id)
    }

    /// Total number of readings in the log.
    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    /// All readings of one meter, ascending by date.
    ///
    /// Readings sharing a date keep their insertion order (stable sort
    /// over the append-only log), so differencing downstream is
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MeterNotFound` if `meter_id` is unknown.
    pub fn readings_for(&self, meter_id: MeterId) -> Result<Vec<Reading>, StoreError> {
        if !self.meters.contains_key(&meter_id) {
            return Err(StoreError::MeterNotFound(meter_id));
        }
        let mut rows: Vec<Reading> = self
            .readings
            .iter()
            .filter(|r| r.meter_id == meter_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }

    /// Readings joined with meter/facility metadata, filtered by the
    /// conjunction of all supplied predicates, ascending by date with the
    /// same stable tie-break as [`readings_for`](Self::readings_for).
    ///
    /// An unknown id inside a filter simply matches nothing; absence of
    /// data is an empty vector, never an error.
    pub fn query(&self, filter: &ReadingFilter) -> Vec<ReadingRow> {
        let mut rows: Vec<ReadingRow> = self
            .readings
            .iter()
            .filter_map(|r| {
                let meter = self.meters.get(&r.meter_id)?;
                if let Some(ids) = &filter.facility_ids {
                    if !ids.contains(&meter.facility_id) {
                        return None;
                    }
                }
                if let Some(types) = &filter.utility_types {
                    if !types.contains(&meter.utility) {
                        return None;
                    }
                }
                if let Some((start, end)) = filter.date_range {
                    if r.date < start || r.date > end {
                        return None;
                    }
                }
                Some(ReadingRow {
                    date: r.date,
                    value: r.value,
                    cost: r.cost,
                    meter_id: r.meter_id,
                    facility_id: meter.facility_id,
                    utility: meter.utility,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.date);
        rows
    }
}
